//! Configuration loading for the obrowd daemon.
//!
//! The configuration lives in `/etc/obrowd/config.toml`; a missing file
//! falls back to the built-in defaults. Values may be overridden by
//! environment variables using the `OBROWD_` prefix and by command-line
//! flags, in that order of precedence.

use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default listen host when none is provided: all interfaces.
const DEFAULT_HOST: &str = "0.0.0.0";
/// Default listen port when none is provided.
const DEFAULT_PORT: u16 = obrow_lib::DEFAULT_PORT;

/// Runtime configuration for the daemon.
#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone)]
pub struct Config {
    /// Host to listen on.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Program to open paths with instead of the host default handler.
    #[serde(default)]
    pub opener_command: Option<String>,
    /// Per-connection read deadline in seconds. Unset keeps line-mode
    /// sessions open for as long as the client does.
    #[serde(default)]
    pub idle_timeout_seconds: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            opener_command: None,
            idle_timeout_seconds: None,
        }
    }
}

/// Command-line overrides for configuration values.
#[derive(Debug, Default, Parser)]
struct CliArgs {
    /// Path to the configuration file.
    #[arg(short, long, value_name = "FILE", default_value = Config::DEFAULT_PATH)]
    config: PathBuf,
    /// Override the listen host.
    #[arg(long)]
    host: Option<String>,
    /// Override the listen port.
    #[arg(short, long)]
    port: Option<u16>,
    /// Override the opener program.
    #[arg(long)]
    opener_command: Option<String>,
}

fn default_host() -> String {
    String::from(DEFAULT_HOST)
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Config {
    /// Default location of the daemon configuration file.
    pub const DEFAULT_PATH: &'static str = "/etc/obrowd/config.toml";

    /// Load the configuration using command-line overrides and environment
    /// variables.
    #[expect(clippy::result_large_err, reason = "propagate figment errors")]
    pub fn load() -> Result<Self, figment::Error> {
        let args = CliArgs::parse();
        Self::from_file_with_cli(&args.config, &args)
    }

    /// Load the configuration from `path`, merging `OBROWD_*` environment
    /// variables over file values. A missing file yields the defaults.
    #[expect(clippy::result_large_err, reason = "propagate figment errors")]
    pub fn from_file(path: &Path) -> Result<Self, figment::Error> {
        Self::from_file_with_cli(path, &CliArgs::default())
    }

    #[expect(clippy::result_large_err, reason = "propagate figment errors")]
    fn from_file_with_cli(path: &Path, cli: &CliArgs) -> Result<Self, figment::Error> {
        let fig = Figment::from(Toml::file(path)).merge(Env::prefixed("OBROWD_").split("__"));
        let mut cfg: Self = fig.extract()?;

        if let Some(host) = &cli.host {
            cfg.host = host.clone();
        }
        if let Some(port) = cli.port {
            cfg.port = port;
        }
        if let Some(command) = &cli.opener_command {
            cfg.opener_command = Some(command.clone());
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::tempdir;

    use test_support::env_guard::{EnvVarGuard, remove_env_var};

    #[rstest]
    #[serial_test::serial]
    fn defaults_apply_without_a_file() {
        remove_env_var("OBROWD_HOST");
        remove_env_var("OBROWD_PORT");
        let cfg = Config::from_file(Path::new("/nonexistent/obrowd.toml")).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, obrow_lib::DEFAULT_PORT);
        assert_eq!(cfg.opener_command, None);
        assert_eq!(cfg.idle_timeout_seconds, None);
    }

    #[rstest]
    #[serial_test::serial]
    fn loads_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "host='127.0.0.1'\nport=8080\nopener_command='xdg-open'\nidle_timeout_seconds=30",
        )
        .unwrap();
        remove_env_var("OBROWD_HOST");
        remove_env_var("OBROWD_PORT");
        let cfg = Config::from_file(&path).unwrap();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.opener_command.as_deref(), Some("xdg-open"));
        assert_eq!(cfg.idle_timeout_seconds, Some(30));
    }

    #[rstest]
    #[serial_test::serial]
    fn env_vars_override_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "host='127.0.0.1'\nport=8080").unwrap();
        let _guard = EnvVarGuard::set("OBROWD_PORT", "9090");
        let cfg = Config::from_file(&path).unwrap();
        assert_eq!(cfg.port, 9090);
        assert_eq!(cfg.host, "127.0.0.1");
    }

    #[rstest]
    #[serial_test::serial]
    fn error_with_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "port='not a number'").unwrap();
        let res = Config::from_file(&path);
        assert!(res.is_err());
    }

    /// CLI arguments take precedence over environment variables and
    /// configuration file values.
    #[rstest]
    #[serial_test::serial]
    fn cli_overrides_env_and_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "port=8080").unwrap();
        let _guard = EnvVarGuard::set("OBROWD_PORT", "9090");
        let cli = CliArgs {
            config: path.clone(),
            host: Some(String::from("::1")),
            port: Some(7070),
            opener_command: None,
        };
        let cfg = Config::from_file_with_cli(&path, &cli).unwrap();
        assert_eq!(cfg.port, 7070);
        assert_eq!(cfg.host, "::1");
    }
}
