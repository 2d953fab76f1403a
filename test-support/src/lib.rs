//! Test support utilities for the obrow workspace.

pub mod daemon;
pub mod env_guard;
pub mod util;

pub use daemon::{RecordingOpener, test_config};
pub use util::{SERVER_RETRY_COUNT, SERVER_RETRY_DELAY, wait_for_server};
