//! Configuration management for plgrab
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use plgrab::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Polling {} every {}", config.service.base_url, config.poll.interval);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `PLGRAB__<section>__<key>`
//!
//! Examples:
//! - `PLGRAB__SERVICE__BASE_URL=http://media-box:5000`
//! - `PLGRAB__POLL__INTERVAL=500ms`
//! - `PLGRAB__DOWNLOAD__DEFAULT_PATH=/srv/media`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/plgrab.toml`.
//! This can be overridden using the `PLGRAB_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::HumanDuration;
pub use models::{Config, DownloadConfig, PollConfig, ServiceConfig};
pub use validation::{ValidationError, validate_poll_interval};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables (`PLGRAB__*`)
    /// 2. TOML file (default: `config/plgrab.toml`)
    /// 3. Default values
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
