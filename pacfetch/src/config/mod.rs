//! Persistent configuration.
//!
//! Settings live in an INI file, by default
//! `$XDG_CONFIG_HOME/pacfetch/config.ini`:
//!
//! ```ini
//! [pacman]
//! conf_file = /etc/pacman.conf
//! cache_dir = /install/var/cache/pacman/pkg
//!
//! [download]
//! backend = requests
//! cache_dir = /var/cache/pacman/pkg
//! parallel_downloads = 4
//! timeout_secs = 300
//! aria2_binary = aria2c
//! queue_capacity = 256
//!
//! [metalink]
//! dir = /var/lib/pacfetch/metalinks
//! ```
//!
//! A missing file yields the defaults. Unknown keys are ignored.

mod file;
mod keys;

pub use file::{
    ConfigFile, DownloadSection, MetalinkSection, PacmanSection, DEFAULT_METALINK_DIR,
};
pub use keys::ConfigKey;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or saving the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    /// The file is not valid INI.
    #[error("failed to parse config file {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    /// A value has the wrong type.
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// The file could not be written.
    #[error("failed to write config file {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    /// The key is not a known configuration key.
    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),
}

/// Directory holding the configuration file.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pacfetch")
}

/// Default location of the configuration file.
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.ini")
}
