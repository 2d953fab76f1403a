//! TCP listener and per-connection protocol handling.
//!
//! Accepts client connections and serves the two protocol modes: a
//! single-shot HTTP response for a minimal GET request line, and an
//! acknowledged line-mode session for everything else. Each connection
//! is owned by exactly one spawned task and closed when that task drops
//! it, on every exit path.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use backon::{ExponentialBackoff, ExponentialBuilder};
use obrow_lib::{OK_REPLY, OpenRequest};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::watch;

use crate::config::Config;
use crate::opener::PathOpener;
use crate::response::{decode_www_form_component, http_response};

/// Upper bound on a single request line.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Minimum delay before retrying a failed accept.
const ACCEPT_RETRY_MIN_DELAY: Duration = Duration::from_millis(100);

/// Errors that terminate a single client connection.
///
/// These never reach the accept loop; the spawn wrapper logs them and the
/// connection closes.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Reading from or writing to the socket failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The configured per-connection read deadline elapsed.
    #[error("client read timed out")]
    Timeout,
    /// The client sent a line longer than [`MAX_LINE_BYTES`].
    #[error("request line exceeds {MAX_LINE_BYTES} bytes")]
    LineTooLong,
}

/// Build a jittered exponential backoff with no maximum attempt count.
fn backoff(min_delay: Duration) -> ExponentialBackoff {
    backon::BackoffBuilder::build(
        ExponentialBuilder::default()
            .with_jitter()
            .with_min_delay(min_delay)
            .without_max_times(),
    )
}

/// Bind the listening socket described by `config`.
///
/// # Errors
/// Returns an error when the address cannot be bound; this is fatal to
/// daemon startup.
pub async fn bind_listener(config: &Config) -> Result<TcpListener> {
    TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))
}

/// Bind the configured address and serve connections until shutdown.
///
/// # Errors
/// Returns an error only when the socket cannot be created. Exiting due
/// to a shutdown signal is normal and not treated as an error.
pub async fn run_listener(
    config: Arc<Config>,
    opener: Arc<dyn PathOpener>,
    shutdown: watch::Receiver<()>,
) -> Result<()> {
    let listener = bind_listener(&config).await?;
    tracing::info!(addr = %listener.local_addr()?, "Listening for open requests");
    accept_loop(listener, config, opener, shutdown).await
}

/// Accept connections on an already-bound listener until shutdown.
///
/// Each connection is served concurrently by [`handle_client`]; the loop
/// never waits for a handler to finish and applies no admission control.
/// A failed accept is logged and retried under backoff, and never stops
/// the daemon.
pub async fn accept_loop(
    listener: TcpListener,
    config: Arc<Config>,
    opener: Arc<dyn PathOpener>,
    mut shutdown: watch::Receiver<()>,
) -> Result<()> {
    let mut accept_backoff = backoff(ACCEPT_RETRY_MIN_DELAY);
    loop {
        tokio::select! {
            res = listener.accept() => match res {
                Ok((stream, peer)) => {
                    accept_backoff = backoff(ACCEPT_RETRY_MIN_DELAY);
                    let config = Arc::clone(&config);
                    let opener = Arc::clone(&opener);
                    tokio::spawn(async move {
                        tracing::debug!(%peer, "Client accepted");
                        if let Err(e) = handle_client(stream, config, opener).await {
                            tracing::warn!(%peer, error = %e, "Client handling failed");
                        }
                        tracing::debug!(%peer, "Client gone");
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept client connection");
                    let delay = accept_backoff.next().unwrap_or(ACCEPT_RETRY_MIN_DELAY);
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {},
                        _ = shutdown.changed() => break,
                    }
                }
            },
            _ = shutdown.changed() => break,
        }
    }
    Ok(())
}

/// Serve one client connection to completion.
///
/// The first line selects the protocol mode. A minimal HTTP GET line
/// yields one response and closes the connection; any other line starts a
/// line-mode session where every line is an independent open request
/// acknowledged with `OK`, until the client closes the stream. Replies
/// are written in lockstep: each acknowledgment goes out before the next
/// line is read.
///
/// The opener's own failures are logged, never surfaced to the client.
///
/// # Errors
/// Fails when socket I/O fails, a line exceeds [`MAX_LINE_BYTES`], or the
/// configured read deadline elapses.
pub async fn handle_client<S>(
    stream: S,
    config: Arc<Config>,
    opener: Arc<dyn PathOpener>,
) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let deadline = config.idle_timeout_seconds.map(Duration::from_secs);
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    if read_request_line(&mut reader, &mut line, deadline).await? == 0 {
        // End of stream before any input: close silently.
        return Ok(());
    }

    match OpenRequest::parse(strip_line_ending(&line)) {
        OpenRequest::HttpGet { raw_segment } => {
            let decoded = decode_www_form_component(&raw_segment);
            open_path(&opener, &decoded).await;
            writer.write_all(http_response(&decoded).as_bytes()).await?;
            writer.shutdown().await?;
        }
        OpenRequest::PlainPath { path } => {
            let mut path = path;
            loop {
                // Empty lines keep the lockstep reply but open nothing.
                if !path.is_empty() {
                    open_path(&opener, &path).await;
                }
                writer.write_all(format!("{OK_REPLY}\n").as_bytes()).await?;
                if read_request_line(&mut reader, &mut line, deadline).await? == 0 {
                    break;
                }
                path = strip_line_ending(&line).to_owned();
            }
        }
    }
    Ok(())
}

/// Invoke the opener for `path`, logging failures instead of propagating.
///
/// The open action may block on process launches, so it runs off the
/// async executor; only this connection's task waits for it.
async fn open_path(opener: &Arc<dyn PathOpener>, path: &str) {
    let owned = path.to_owned();
    let opener = Arc::clone(opener);
    match tokio::task::spawn_blocking(move || opener.open(&owned)).await {
        Ok(Ok(())) => tracing::info!(path, "Opened"),
        Ok(Err(e)) => tracing::error!(path, error = %e, "Open action failed"),
        Err(e) => tracing::error!(path, error = %e, "Open task failed"),
    }
}

/// Read one request line, clearing `line` first.
///
/// Returns the number of bytes read; zero means end of stream.
async fn read_request_line<R>(
    reader: &mut R,
    line: &mut String,
    deadline: Option<Duration>,
) -> Result<usize, ConnectionError>
where
    R: AsyncBufRead + Unpin,
{
    line.clear();
    let read = reader.read_line(line);
    let n = match deadline {
        Some(limit) => tokio::time::timeout(limit, read)
            .await
            .map_err(|_| ConnectionError::Timeout)??,
        None => read.await?,
    };
    if n > MAX_LINE_BYTES {
        return Err(ConnectionError::LineTooLong);
    }
    Ok(n)
}

fn strip_line_ending(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opener::testing::RecordingOpener;
    use tokio::io::{AsyncReadExt, duplex};
    use tokio::time::advance;

    fn config() -> Arc<Config> {
        Arc::new(Config {
            host: String::from("127.0.0.1"),
            port: 0,
            ..Config::default()
        })
    }

    async fn read_to_end(mut stream: impl AsyncRead + Unpin) -> String {
        let mut out = String::new();
        stream.read_to_string(&mut out).await.expect("read");
        out
    }

    #[tokio::test]
    async fn http_request_opens_decoded_path_and_responds() {
        let opener = Arc::new(RecordingOpener::default());
        let (mut client, server) = duplex(4096);
        let handle = tokio::spawn(handle_client(server, config(), opener.clone()));

        client
            .write_all(b"GET /https%3A%2F%2Fexample.com HTTP/1.1\n")
            .await
            .expect("write");
        let response = read_to_end(&mut client).await;

        handle.await.expect("join").expect("handle");
        assert!(response.starts_with("HTTP/1.0 200 OK\n"));
        assert!(response.contains("<p>https://example.com</p>"));
        assert_eq!(opener.opened(), ["https://example.com"]);
    }

    #[tokio::test]
    async fn line_mode_acknowledges_each_line_in_order() {
        let opener = Arc::new(RecordingOpener::default());
        let (mut client, server) = duplex(4096);
        let handle = tokio::spawn(handle_client(server, config(), opener.clone()));

        client
            .write_all(b"https://example.com\n/tmp/file.txt\n")
            .await
            .expect("write");
        client.shutdown().await.expect("close write half");
        let replies = read_to_end(&mut client).await;

        handle.await.expect("join").expect("handle");
        assert_eq!(replies, "OK\nOK\n");
        assert_eq!(opener.opened(), ["https://example.com", "/tmp/file.txt"]);
    }

    #[tokio::test]
    async fn eof_before_any_line_is_a_silent_no_op() {
        let opener = Arc::new(RecordingOpener::default());
        let (mut client, server) = duplex(4096);
        let handle = tokio::spawn(handle_client(server, config(), opener.clone()));

        client.shutdown().await.expect("close write half");
        let replies = read_to_end(&mut client).await;

        handle.await.expect("join").expect("handle");
        assert_eq!(replies, "");
        assert!(opener.opened().is_empty());
    }

    #[tokio::test]
    async fn blank_line_is_acknowledged_without_opening() {
        let opener = Arc::new(RecordingOpener::default());
        let (mut client, server) = duplex(4096);
        let handle = tokio::spawn(handle_client(server, config(), opener.clone()));

        client.write_all(b"\n/tmp/a\n").await.expect("write");
        client.shutdown().await.expect("close write half");
        let replies = read_to_end(&mut client).await;

        handle.await.expect("join").expect("handle");
        assert_eq!(replies, "OK\nOK\n");
        assert_eq!(opener.opened(), ["/tmp/a"]);
    }

    #[tokio::test]
    async fn opener_failure_is_not_surfaced_to_the_client() {
        let opener = Arc::new(RecordingOpener::failing());
        let (mut client, server) = duplex(4096);
        let handle = tokio::spawn(handle_client(server, config(), opener.clone()));

        client.write_all(b"/tmp/missing\n").await.expect("write");
        client.shutdown().await.expect("close write half");
        let replies = read_to_end(&mut client).await;

        handle.await.expect("join").expect("handle");
        assert_eq!(replies, "OK\n");
        assert_eq!(opener.opened(), ["/tmp/missing"]);
    }

    #[tokio::test]
    async fn carriage_returns_are_stripped_before_interpretation() {
        let opener = Arc::new(RecordingOpener::default());
        let (mut client, server) = duplex(4096);
        let handle = tokio::spawn(handle_client(server, config(), opener.clone()));

        client
            .write_all(b"GET /index.html HTTP/1.1\r\n")
            .await
            .expect("write");
        let response = read_to_end(&mut client).await;

        handle.await.expect("join").expect("handle");
        assert!(response.starts_with("HTTP/1.0 200 OK\n"));
        assert_eq!(opener.opened(), ["index.html"]);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_connection_times_out_when_a_deadline_is_set() {
        let config = Arc::new(Config {
            idle_timeout_seconds: Some(5),
            ..Config::default()
        });
        let opener = Arc::new(RecordingOpener::default());
        let (client, server) = duplex(4096);
        let handle = tokio::spawn(handle_client(server, config, opener));

        // Let the handler register its read before the clock moves.
        tokio::task::yield_now().await;
        advance(Duration::from_secs(6)).await;

        let err = handle.await.expect("join").expect_err("expected timeout");
        assert!(matches!(err, ConnectionError::Timeout));
        drop(client);
    }

    #[tokio::test]
    async fn oversized_line_terminates_the_connection() {
        let opener = Arc::new(RecordingOpener::default());
        let (mut client, server) = duplex(MAX_LINE_BYTES * 2);
        let handle = tokio::spawn(handle_client(server, config(), opener.clone()));

        let mut line = vec![b'a'; MAX_LINE_BYTES + 1];
        line.push(b'\n');
        client.write_all(&line).await.expect("write");
        client.shutdown().await.expect("close write half");

        let err = handle.await.expect("join").expect_err("expected size error");
        assert!(matches!(err, ConnectionError::LineTooLong));
        assert!(opener.opened().is_empty());
    }
}
