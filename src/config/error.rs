//! Errors raised while locating, parsing or validating a ttyport config.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No ttyport config at '{}'", .0.display())]
    NotFound(PathBuf),

    #[error("Cannot read ttyport config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{}' is not a valid ttyport config: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Cannot encode config as TOML: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Cannot write ttyport config '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value that parsed but is out of range for the port.
    #[error("Invalid configuration value for '{key}': {message}")]
    Invalid { key: String, message: String },

    #[error("Bad value in {var}: {message}")]
    Env { var: String, message: String },

    /// `save` on a loader that was built from defaults.
    #[error("Config has no file path to save to")]
    NoPath,
}

impl ConfigError {
    pub fn validation<K: Into<String>, M: Into<String>>(key: K, message: M) -> Self {
        Self::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn env_parse<V: Into<String>, M: Into<String>>(var: V, message: M) -> Self {
        Self::Env {
            var: var.into(),
            message: message.into(),
        }
    }

    /// The config file itself is missing or unreadable, as opposed to
    /// holding a bad value. Callers may fall back to defaults for these.
    pub fn is_file_problem(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Read { .. } | Self::Parse { .. })
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
