use std::panic::Location;
use std::path::PathBuf;
use std::result::Result as StdResult;

use error_location::ErrorLocation;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum ConfigError {
    #[error("{category} error: {message} {location}")]
    Generic {
        category: &'static str,
        message: String,
        location: ErrorLocation,
    },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    /// Create a config error
    #[track_caller]
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::generic("Config", message)
    }

    /// Create a game server error
    #[track_caller]
    pub fn game_server<S: Into<String>>(message: S) -> Self {
        Self::generic("GameServer", message)
    }

    /// Create a tunnel error
    #[track_caller]
    pub fn tunnel<S: Into<String>>(message: S) -> Self {
        Self::generic("Tunnel", message)
    }

    /// Create a DNS error
    #[track_caller]
    pub fn dns<S: Into<String>>(message: S) -> Self {
        Self::generic("Dns", message)
    }

    /// Create a health error
    #[track_caller]
    pub fn health<S: Into<String>>(message: S) -> Self {
        Self::generic("Health", message)
    }

    #[track_caller]
    fn generic<S: Into<String>>(category: &'static str, message: S) -> Self {
        ConfigError::Generic {
            category,
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type ConfigErrorResult<T> = StdResult<T, ConfigError>;
