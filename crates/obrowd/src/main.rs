//! Entry point for the obrowd daemon binary.
//!
//! Listens on a TCP port and asks the host to open each requested path
//! or URL with its default handler.

use std::process::ExitCode;
use std::sync::Arc;

use obrowd::config::Config;
use obrowd::opener::SystemOpener;
use obrowd::{daemon, logging};

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let opener = Arc::new(SystemOpener::from_config(&config));
    if let Err(e) = daemon::run(config, opener).await {
        tracing::error!(error = %e, "Daemon terminated");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
