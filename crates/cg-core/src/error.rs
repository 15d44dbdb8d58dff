use std::panic::Location;
use std::time::Duration;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{operation} timed out after {timeout_ms}ms {location}")]
    Timeout {
        operation: String,
        timeout_ms: u64,
        location: ErrorLocation,
    },
}

impl CoreError {
    #[track_caller]
    pub fn timeout<S: Into<String>>(operation: S, timeout: Duration) -> Self {
        CoreError::Timeout {
            operation: operation.into(),
            timeout_ms: timeout.as_millis() as u64,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
