use crate::ProcessStatus;

use std::panic::Location;
use std::path::PathBuf;

use cg_core::CoreError;
use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("{name} is already {status} {location}")]
    AlreadyRunning {
        name: String,
        status: ProcessStatus,
        location: ErrorLocation,
    },

    #[error("{name} is not running (status: {status}) {location}")]
    NotRunning {
        name: String,
        status: ProcessStatus,
        location: ErrorLocation,
    },

    #[error("Binary not found at {path} {location}")]
    BinaryNotFound {
        path: PathBuf,
        location: ErrorLocation,
    },

    #[error("Failed to spawn {name}: {source} {location}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("{name} failed to start: {message} {location}")]
    StartupFailed {
        name: String,
        message: String,
        location: ErrorLocation,
    },

    #[error("{operation} timed out after {timeout_ms}ms {location}")]
    Timeout {
        operation: String,
        timeout_ms: u64,
        location: ErrorLocation,
    },

    #[error("{name} exhausted {attempts} restart attempts {location}")]
    RestartExhausted {
        name: String,
        attempts: u32,
        location: ErrorLocation,
    },

    #[error("IO error: {source} {location}")]
    Io {
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },
}

impl SupervisorError {
    #[track_caller]
    pub fn already_running(name: &str, status: ProcessStatus) -> Self {
        Self::AlreadyRunning {
            name: name.to_string(),
            status,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn not_running(name: &str, status: ProcessStatus) -> Self {
        Self::NotRunning {
            name: name.to_string(),
            status,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn binary_not_found(path: PathBuf) -> Self {
        Self::BinaryNotFound {
            path,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn startup_failed<S: Into<String>>(name: &str, message: S) -> Self {
        Self::StartupFailed {
            name: name.to_string(),
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Whether the caller may reasonably try the same operation again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::StartupFailed { .. } | Self::Io { .. }
        )
    }

    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::AlreadyRunning { .. } => "The process is already running. Stop it first.",
            Self::NotRunning { .. } => "Start the process before sending it commands.",
            Self::BinaryNotFound { .. } => {
                "The executable could not be found. Check the configured path."
            }
            Self::Timeout { .. } => {
                "The process took too long. Check its output or raise the timeout."
            }
            Self::RestartExhausted { .. } => {
                "The process keeps crashing. Inspect its output, then start it manually."
            }
            _ => "An unexpected error occurred. Please check the logs for details.",
        }
    }
}

impl From<std::io::Error> for SupervisorError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<CoreError> for SupervisorError {
    #[track_caller]
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Timeout {
                operation,
                timeout_ms,
                ..
            } => Self::Timeout {
                operation,
                timeout_ms,
                location: ErrorLocation::from(Location::caller()),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
