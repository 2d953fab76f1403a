//! Daemon orchestration for obrowd.
//!
//! Converts SIGINT and SIGTERM into a shutdown signal and owns the
//! listener task's lifecycle. The listener runs for the life of the
//! process; a bind failure is fatal and reported to the caller.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::watch;

use crate::config::Config;
use crate::listener::run_listener;
use crate::opener::PathOpener;

/// Start the daemon with the provided configuration and opener.
///
/// Runs until a shutdown signal arrives. Under normal operation the
/// listener never exits on its own.
///
/// # Errors
/// Returns an error when the listening address cannot be bound or the
/// listener task panics.
pub async fn run(config: Config, opener: Arc<dyn PathOpener>) -> Result<()> {
    let config = Arc::new(config);
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    spawn_signal_handler(shutdown_tx);

    let mut shutdown = shutdown_rx.clone();
    let mut listener = tokio::spawn(run_listener(config, opener, shutdown_rx));

    tokio::select! {
        _ = shutdown.changed() => {
            listener.abort();
            let _ = listener.await;
            tracing::info!("Shutdown complete");
            Ok(())
        }
        res = &mut listener => match res {
            Ok(inner) => inner,
            Err(e) if e.is_panic() => Err(anyhow!("listener task panicked: {e}")),
            Err(_) => Ok(()),
        },
    }
}

/// Convert SIGINT and SIGTERM into a shutdown signal.
fn spawn_signal_handler(shutdown_tx: watch::Sender<()>) {
    tokio::spawn(async move {
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGINT handler");
                let _ = shutdown_tx.send(());
                return;
            }
        };
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                let _ = shutdown_tx.send(());
                return;
            }
        };

        tokio::select! {
            _ = sigint.recv() => {
                tracing::info!("SIGINT received, shutting down");
            }
            _ = sigterm.recv() => {
                tracing::info!("SIGTERM received, shutting down");
            }
        }
        let _ = shutdown_tx.send(());
    });
}
