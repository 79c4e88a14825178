//! Configuration file
//!
//! User settings live in `~/.geotiles/config.ini`. Command-line flags take
//! precedence over file values.

mod file;
mod keys;
mod size;

use std::path::PathBuf;

use thiserror::Error;

pub use file::{
    app_dir, config_file_path, CacheSettings, ConfigFile, DownloadSettings, LoggingSettings,
    ProviderSettings,
};
pub use keys::ConfigKey;
pub use size::{format_size, parse_size};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("invalid size '{0}' (expected e.g. 500MB, 2GB or a byte count)")]
    InvalidSize(String),

    #[error("configuration I/O error: {0}")]
    Io(#[from] std::io::Error),
}
