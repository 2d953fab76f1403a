//! Helpers for exercising the daemon in tests.

use std::io;
use std::sync::Mutex;

use obrowd::config::Config;
use obrowd::opener::PathOpener;

/// Build a [`Config`] bound to the loopback interface on an ephemeral
/// port, with no opener override and no read deadline.
pub fn test_config() -> Config {
    Config {
        host: String::from("127.0.0.1"),
        port: 0,
        opener_command: None,
        idle_timeout_seconds: None,
    }
}

/// A [`PathOpener`] that records every invocation instead of touching the
/// host, optionally reporting failure.
#[derive(Debug, Default)]
pub struct RecordingOpener {
    opened: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingOpener {
    /// A recording opener whose every invocation reports failure.
    pub fn failing() -> Self {
        Self {
            opened: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// The paths opened so far, in invocation order.
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().expect("lock opened paths").clone()
    }
}

impl PathOpener for RecordingOpener {
    fn open(&self, path: &str) -> io::Result<()> {
        self.opened
            .lock()
            .expect("lock opened paths")
            .push(path.to_owned());
        if self.fail {
            return Err(io::Error::other("open action failed"));
        }
        Ok(())
    }
}
