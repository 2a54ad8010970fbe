//! The client side: prepare the request, reach the daemon (spawning it
//! if necessary), format the reply.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::time::Duration;

use anyhow::{Context, Result};

use goco_common::source::{codepoint_to_byte_offset, strip_shebang};
use goco_common::BuildEnv;
use goco_engine::formatter_by_name;

use crate::rpc::{AutoCompleteReply, Request};
use crate::{socket_path, Args, SockType};

/// A line-oriented connection over either socket type.
enum Conn {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Conn {
    fn split(self) -> Result<(Box<dyn Read>, Box<dyn Write>)> {
        Ok(match self {
            Conn::Tcp(s) => {
                let r = s.try_clone().context("cloning tcp stream")?;
                (Box::new(r), Box::new(s))
            }
            #[cfg(unix)]
            Conn::Unix(s) => {
                let r = s.try_clone().context("cloning unix stream")?;
                (Box::new(r), Box::new(s))
            }
        })
    }
}

pub fn run(args: &Args) -> Result<i32> {
    let conn = match connect(args) {
        Ok(conn) => conn,
        Err(_) => {
            if args.sock == SockType::Unix {
                let path = socket_path();
                if path.exists() {
                    let _ = std::fs::remove_file(&path);
                }
            }
            spawn_server(args)?;
            connect_with_retry(args)?
        }
    };

    match args.command.first().map(String::as_str) {
        Some("autocomplete") => cmd_auto_complete(args, conn),
        Some("close") | Some("exit") => cmd_exit(conn),
        Some(other) => {
            eprintln!("goco: unknown subcommand: {other:?}\nRun 'goco --help' for usage.");
            Ok(1)
        }
        None => Ok(0),
    }
}

fn connect(args: &Args) -> Result<Conn> {
    match args.sock {
        SockType::Tcp => Ok(Conn::Tcp(TcpStream::connect(&args.addr)?)),
        #[cfg(unix)]
        SockType::Unix => Ok(Conn::Unix(UnixStream::connect(socket_path())?)),
        #[cfg(not(unix))]
        SockType::Unix => anyhow::bail!("unix sockets are not supported on this platform"),
    }
}

/// The daemon can take a moment to come up; poll for about a second.
fn connect_with_retry(args: &Args) -> Result<Conn> {
    let mut waited = Duration::ZERO;
    loop {
        match connect(args) {
            Ok(conn) => return Ok(conn),
            Err(err) => {
                if waited >= Duration::from_millis(1000) {
                    return Err(err).context("connecting to the goco daemon");
                }
                std::thread::sleep(Duration::from_millis(10));
                waited += Duration::from_millis(10);
            }
        }
    }
}

fn spawn_server(args: &Args) -> Result<()> {
    let exe = std::env::current_exe().context("locating the goco executable")?;
    let sock = match args.sock {
        SockType::Tcp => "tcp",
        SockType::Unix => "unix",
    };
    std::process::Command::new(exe)
        .args(["-s", "--sock", sock, "--addr", &args.addr])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .context("starting the goco daemon")?;
    Ok(())
}

fn cmd_auto_complete(args: &Args, conn: Conn) -> Result<i32> {
    let (source, filename, cursor) = prepare_request(args)?;
    let request = Request::AutoComplete {
        filename,
        source,
        cursor,
        env: BuildEnv::default(),
    };

    let (reader, mut writer) = conn.split()?;
    let line = serde_json::to_string(&request)?;
    writeln!(writer, "{line}")?;
    writer.flush()?;

    let mut reply_line = String::new();
    BufReader::new(reader).read_line(&mut reply_line)?;
    let reply: AutoCompleteReply =
        serde_json::from_str(&reply_line).context("malformed daemon reply")?;

    let format = formatter_by_name(&args.format);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    format(&mut out, &reply.candidates, reply.len)?;
    Ok(0)
}

fn cmd_exit(conn: Conn) -> Result<i32> {
    let (_reader, mut writer) = conn.split()?;
    let line = serde_json::to_string(&Request::Exit)?;
    writeln!(writer, "{line}")?;
    writer.flush()?;
    Ok(0)
}

/// Read the source, resolve the filename, and compute the byte cursor.
///
/// The offset argument is bytes by default; a `c`/`C` prefix means
/// codepoints. A shebang line is stripped and the cursor shifted by the
/// removed length.
fn prepare_request(args: &Args) -> Result<(String, String, isize)> {
    let mut data = Vec::new();
    if let Some(input) = &args.input {
        std::fs::File::open(input)
            .and_then(|mut f| f.read_to_end(&mut data))
            .with_context(|| format!("reading {}", input.display()))?;
    } else {
        std::io::stdin()
            .read_to_end(&mut data)
            .context("reading stdin")?;
    }

    let mut filename = args
        .input
        .as_ref()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut offset = "";
    match args.command.len() {
        2 => offset = &args.command[1],
        3 => {
            filename = args.command[1].clone();
            offset = &args.command[2];
        }
        _ => {}
    }

    if !filename.is_empty() {
        if let Ok(abs) = std::fs::canonicalize(&filename) {
            filename = abs.to_string_lossy().into_owned();
        }
    }

    let mut cursor: isize = -1;
    if !offset.is_empty() {
        if let Some(rest) = offset.strip_prefix(['c', 'C']) {
            let codepoints: usize = rest.parse().unwrap_or(0);
            cursor = codepoint_to_byte_offset(&data, codepoints) as isize;
        } else {
            cursor = offset.parse().unwrap_or(-1);
        }
    }

    let (trimmed, removed) = strip_shebang(&data);
    cursor -= removed as isize;
    Ok((
        String::from_utf8_lossy(trimmed).into_owned(),
        filename,
        cursor,
    ))
}
