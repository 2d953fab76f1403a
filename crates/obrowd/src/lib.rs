//! Library components for the obrowd daemon.
//!
//! # Overview
//! This crate exposes:
//! - [`config::Config`] — typed daemon configuration loaded from
//!   `/etc/obrowd/config.toml` with environment and CLI overrides.
//! - [`opener::PathOpener`] — the capability that asks the host to open a
//!   path or URL with its default handler.
//! - [`listener`] — the TCP accept loop and per-connection protocol
//!   handling.
//! - [`daemon::run`] — signal handling and the listener's lifecycle.
//!
//! # Examples
//! ```rust,no_run
//! use std::sync::Arc;
//! use obrowd::config::Config;
//! use obrowd::opener::SystemOpener;
//!
//! # async fn start() -> anyhow::Result<()> {
//! let config = Config::load()?;
//! let opener = Arc::new(SystemOpener::from_config(&config));
//! obrowd::daemon::run(config, opener).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod daemon;
pub mod listener;
pub mod logging;
pub mod opener;
pub mod response;
