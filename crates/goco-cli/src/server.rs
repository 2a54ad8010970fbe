//! The daemon: accepts connections, answers completion requests.
//!
//! Each connection gets a thread; the engine is re-entrant, so the
//! only shared state is its package cache. A panic inside the engine
//! is caught per request and answered with the synthetic PANIC
//! candidate instead of killing the daemon.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
#[cfg(unix)]
use std::os::unix::net::UnixListener;
use std::panic::{catch_unwind, AssertUnwindSafe};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use goco_engine::{Candidate, Config, Suggester};

use crate::rpc::{AutoCompleteReply, Request};
use crate::{socket_path, Args, SockType};

pub fn run(args: &Args) -> Result<()> {
    match args.sock {
        SockType::Tcp => {
            let listener = TcpListener::bind(&args.addr)
                .with_context(|| format!("binding {}", args.addr))?;
            info!(target: "goco::server", addr = %args.addr, "listening");
            accept_loop(args, || listener.accept().map(|(s, _)| s))
        }
        #[cfg(unix)]
        SockType::Unix => {
            let path = socket_path();
            if path.exists() {
                warn!(target: "goco::server", path = %path.display(), "socket file already exists");
                let _ = std::fs::remove_file(&path);
            }
            let listener = UnixListener::bind(&path)
                .with_context(|| format!("binding {}", path.display()))?;
            info!(target: "goco::server", path = %path.display(), "listening");
            let result = accept_loop(args, || listener.accept().map(|(s, _)| s));
            let _ = std::fs::remove_file(&path);
            result
        }
        #[cfg(not(unix))]
        SockType::Unix => anyhow::bail!("unix sockets are not supported on this platform"),
    }
}

fn accept_loop<S, F>(args: &Args, mut accept: F) -> Result<()>
where
    S: std::io::Read + Write + Send + 'static,
    F: FnMut() -> std::io::Result<S>,
{
    let debug = args.debug;
    loop {
        let stream = match accept() {
            Ok(s) => s,
            Err(err) => {
                warn!(target: "goco::server", "accept failed: {err}");
                continue;
            }
        };
        std::thread::spawn(move || {
            if let Err(err) = serve_connection(stream, debug) {
                debug!(target: "goco::server", "connection ended: {err}");
            }
        });
    }
}

fn serve_connection<S: std::io::Read + Write>(stream: S, debug: bool) -> Result<()> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(());
        }
        if line.trim().is_empty() {
            continue;
        }
        let request: Request = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(err) => {
                warn!(target: "goco::server", "malformed request: {err}");
                continue;
            }
        };
        match request {
            Request::AutoComplete {
                filename,
                source,
                cursor,
                env,
            } => {
                let reply = handle_auto_complete(&filename, &source, cursor, env, debug);
                let out = serde_json::to_string(&reply)?;
                let stream = reader.get_mut();
                writeln!(stream, "{out}")?;
                stream.flush()?;
            }
            Request::Exit => {
                let stream = reader.get_mut();
                writeln!(stream, "{{}}")?;
                stream.flush()?;
                info!(target: "goco::server", "exit requested");
                // Give the reply a moment to reach the client.
                std::thread::spawn(|| {
                    std::thread::sleep(std::time::Duration::from_secs(1));
                    std::process::exit(0);
                });
            }
        }
    }
}

fn handle_auto_complete(
    filename: &str,
    source: &str,
    cursor: isize,
    env: goco_common::BuildEnv,
    debug: bool,
) -> AutoCompleteReply {
    if debug {
        debug!(target: "goco::server", %filename, cursor, "autocompletion request");
        if cursor >= 0 && (cursor as usize) <= source.len() {
            let c = cursor as usize;
            debug!(
                target: "goco::server",
                "buffer:\n-------------------------------------------------------\n{}#{}\n-------------------------------------------------------",
                &source[..c],
                &source[c..]
            );
        }
    }

    let suggester = Suggester::new(Config {
        debug,
        env,
        ..Config::default()
    });
    let src = source.as_bytes();
    let (candidates, len) = match catch_unwind(AssertUnwindSafe(|| {
        suggester.suggest(filename, src, cursor)
    })) {
        Ok(result) => result,
        Err(payload) => {
            let msg = panic_message(&payload);
            warn!(target: "goco::server", "panic during completion: {msg}");
            (vec![Candidate::panic()], 0)
        }
    };

    if debug {
        debug!(target: "goco::server", len, count = candidates.len(), "reply");
        for c in &candidates {
            debug!(target: "goco::server", "  {c}");
        }
    }
    AutoCompleteReply { candidates, len }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
