use std::panic::Location;

use cg_config::ConfigError;
use cg_dns::DnsError;
use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("Config error: {source} {location}")]
    Config {
        #[source]
        source: ConfigError,
        location: ErrorLocation,
    },

    #[error("DNS setup failed: {source} {location}")]
    Dns {
        #[source]
        source: DnsError,
        location: ErrorLocation,
    },

    #[error("Failed to initialize logging: {message} {location}")]
    Logging {
        message: String,
        location: ErrorLocation,
    },
}

impl DaemonError {
    #[track_caller]
    pub fn logging<S: Into<String>>(message: S) -> Self {
        Self::Logging {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ConfigError> for DaemonError {
    #[track_caller]
    fn from(source: ConfigError) -> Self {
        Self::Config {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<DnsError> for DaemonError {
    #[track_caller]
    fn from(source: DnsError) -> Self {
        Self::Dns {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

pub type Result<T> = std::result::Result<T, DaemonError>;
