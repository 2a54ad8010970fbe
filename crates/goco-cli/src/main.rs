//! goco: an autocompletion daemon for the Go programming language.
//!
//! The same binary is both the client and the daemon. Editors invoke
//! the client (`goco autocomplete <offset>` with the file on stdin);
//! the client connects to the daemon over a tcp or unix socket,
//! spawning it first if none is running.

mod client;
mod rpc;
mod server;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "goco",
    version,
    about = "An autocompletion daemon for the Go programming language"
)]
pub struct Args {
    /// Run the daemon in the foreground instead of acting as a client.
    #[arg(short = 's', long = "server")]
    pub server: bool,

    /// Socket type to use.
    #[arg(long, value_enum, default_value = "tcp")]
    pub sock: SockType,

    /// Address to listen on / connect to (tcp only).
    #[arg(long, default_value = "127.0.0.1:37373")]
    pub addr: String,

    /// Read the source from this file instead of stdin; also the
    /// default filename for the request.
    #[arg(long = "in")]
    pub input: Option<PathBuf>,

    /// Enable debug output.
    #[arg(long)]
    pub debug: bool,

    /// Output format: nice, json, vim, emacs, csv, or godit.
    #[arg(short = 'f', long = "format", default_value = "nice")]
    pub format: String,

    /// Subcommand and its arguments:
    /// `autocomplete [filename] <offset>`, `close`, `exit`.
    #[arg(trailing_var_arg = true)]
    pub command: Vec<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum SockType {
    Tcp,
    Unix,
}

/// The unix socket path: one daemon per user in the temp directory.
pub fn socket_path() -> PathBuf {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "all".to_string());
    std::env::temp_dir().join(format!("goco-daemon.{user}"))
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                if args.debug {
                    "goco=debug".parse()?
                } else {
                    "goco=warn".parse()?
                },
            ),
        )
        .with_writer(std::io::stderr)
        .init();

    if args.server {
        server::run(&args)
    } else {
        let code = client::run(&args)?;
        std::process::exit(code);
    }
}
