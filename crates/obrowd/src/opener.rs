//! The host open action.
//!
//! The daemon never opens anything itself; it invokes this capability and
//! leaves the platform mechanics to it. Production code uses
//! [`SystemOpener`]; tests substitute a recording implementation.

use std::io;

use crate::config::Config;

/// Capability that asks the host environment to open a path or URL with
/// its default handler.
///
/// Implementations must be safe to invoke concurrently from multiple
/// connection handlers; each invocation is independent and stateless.
pub trait PathOpener: Send + Sync {
    /// Open `path` with the host's default action.
    ///
    /// # Errors
    /// Returns an error when no opener could be launched or the opener
    /// reported failure. Callers log this; it is never surfaced to the
    /// requesting client.
    fn open(&self, path: &str) -> io::Result<()>;
}

/// Opens paths with the host default handler.
///
/// Delegates to the `open` crate, which picks the platform mechanism
/// (`xdg-open` and friends on Linux, `ShellExecute` on Windows). A
/// configured `opener_command` forces a specific program instead.
#[derive(Debug, Clone, Default)]
pub struct SystemOpener {
    command: Option<String>,
}

impl SystemOpener {
    /// Build the opener described by `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            command: config.opener_command.clone(),
        }
    }
}

impl PathOpener for SystemOpener {
    fn open(&self, path: &str) -> io::Result<()> {
        match &self.command {
            Some(command) => open::with(path, command),
            None => open::that(path),
        }
    }
}
