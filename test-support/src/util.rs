//! Utility helpers for asynchronous tests.
//!
//! Provides functions to synchronize with background tasks in tests.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::sleep;

/// Default number of connection attempts in [`wait_for_server`].
pub const SERVER_RETRY_COUNT: u32 = 50;
/// Default pause between connection attempts in [`wait_for_server`].
pub const SERVER_RETRY_DELAY: Duration = Duration::from_millis(20);

/// Wait for a TCP server to accept connections at `addr`.
///
/// Returns `true` once a connection succeeds within `tries` attempts.
///
/// # Examples
///
/// ```rust,ignore
/// use test_support::{wait_for_server, SERVER_RETRY_COUNT, SERVER_RETRY_DELAY};
///
/// let up = wait_for_server(addr, SERVER_RETRY_COUNT, SERVER_RETRY_DELAY).await;
/// assert!(up);
/// ```
pub async fn wait_for_server(addr: SocketAddr, tries: u32, delay: Duration) -> bool {
    for _ in 0..tries {
        if TcpStream::connect(addr).await.is_ok() {
            return true;
        }
        sleep(delay).await;
    }
    false
}
