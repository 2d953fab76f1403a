//! CLI client for the obrow daemon.
//! Sends each path argument as a line-mode open request.

use clap::Parser;
use obrow::{Args, run};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("obrow: {e}");
            ExitCode::FAILURE
        }
    }
}
