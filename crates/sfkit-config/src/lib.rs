//! Configuration management system for sfkit
//!
//! This crate loads the settings the tree engine and the CLI run with,
//! supporting multiple configuration formats (YAML, TOML, JSON), validation
//! and environment variable overrides.
//!
//! # Features
//!
//! - **Multiple formats**: YAML, TOML and JSON configuration files
//! - **Validation**: concurrency bounds, ignore globs and log level are checked up front
//! - **Environment overrides**: `SFKIT__ENGINE__CONCURRENCY_LIMIT=4` and friends
//! - **Defaults**: every field has a default, so an empty file is valid
//!
//! # Examples
//!
//! ```rust,no_run
//! use sfkit_config::{Config, ConfigBuilder};
//!
//! let config = ConfigBuilder::new()
//!     .add_source_file("sfkit.yaml")
//!     .add_env_prefix("SFKIT")
//!     .build()
//!     .expect("Failed to load configuration");
//!
//! println!("Workers: {}", config.engine.concurrency_limit.get());
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use sfkit_types::EngineConfig;

pub mod builder;
pub mod error;
pub mod loader;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

/// Main configuration structure for sfkit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Tree engine settings
    #[serde(default)]
    pub engine: EngineConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log file path, stderr when unset
    pub log_file: Option<PathBuf>,
    /// Enable JSON formatting
    pub json_format: bool,
    /// Enable colored output
    pub colored_output: bool,
}

impl LoggingConfig {
    /// Levels accepted by [`LoggingConfig::level`]
    pub const LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            log_file: None,
            json_format: false,
            colored_output: true,
        }
    }
}
