//! Library utilities for the `obrow` CLI.
//!
//! Sends paths or URLs to a running `obrowd` daemon over its line-mode
//! protocol: one line per path, one `OK` acknowledgment per line, in
//! lockstep.

use clap::Parser;
use obrow_lib::{DEFAULT_PORT, OK_REPLY};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// Command line arguments for the `obrow` client.
#[derive(Debug, Clone, Parser)]
#[command(name = "obrow", about = "Ask a running obrowd to open paths or URLs")]
pub struct Args {
    /// Paths or URLs to open, one request per argument.
    #[arg(required = true)]
    pub paths: Vec<String>,

    /// Host where the daemon listens.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// TCP port where the daemon listens.
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

/// Errors that can occur when interacting with the daemon.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connecting to the daemon failed.
    #[error("failed to connect to daemon: {0}")]
    Connect(#[source] std::io::Error),
    /// Writing a request line to the daemon failed.
    #[error("failed to write to daemon: {0}")]
    Write(#[source] std::io::Error),
    /// Reading an acknowledgment failed.
    #[error("failed to read acknowledgment: {0}")]
    Read(#[source] std::io::Error),
    /// The daemon closed the connection before acknowledging.
    #[error("daemon closed the connection before acknowledging")]
    ConnectionClosed,
    /// The daemon replied with something other than `OK`.
    #[error("unexpected reply from daemon: {0:?}")]
    UnexpectedReply(String),
}

/// Send each path to the daemon and verify its acknowledgment.
///
/// # Examples
///
/// ```no_run
/// # use obrow::{Args, run};
/// # async fn try_run() -> Result<(), obrow::ClientError> {
/// let args = Args {
///     paths: vec![String::from("https://example.com")],
///     host: String::from("127.0.0.1"),
///     port: 8080,
/// };
/// run(args).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run(args: Args) -> Result<(), ClientError> {
    let stream = TcpStream::connect((args.host.as_str(), args.port))
        .await
        .map_err(ClientError::Connect)?;
    let (read_half, mut write_half) = stream.into_split();
    let mut replies = BufReader::new(read_half);

    for path in &args.paths {
        write_half
            .write_all(format!("{path}\n").as_bytes())
            .await
            .map_err(ClientError::Write)?;

        let mut reply = String::new();
        let n = replies
            .read_line(&mut reply)
            .await
            .map_err(ClientError::Read)?;
        if n == 0 {
            return Err(ClientError::ConnectionClosed);
        }
        let reply = reply.trim_end();
        if reply != OK_REPLY {
            return Err(ClientError::UnexpectedReply(reply.to_owned()));
        }
    }
    Ok(())
}
