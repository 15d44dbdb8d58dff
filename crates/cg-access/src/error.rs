use crate::PublicAccessStatus;

use std::panic::Location;
use std::time::Duration;

use cg_core::CoreError;
use cg_dns::DnsError;
use cg_process::SupervisorError;
use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccessError {
    #[error("Tunnel error: {source} {location}")]
    Supervisor {
        #[source]
        source: SupervisorError,
        location: ErrorLocation,
    },

    #[error("DNS error: {source} {location}")]
    Dns {
        #[source]
        source: DnsError,
        location: ErrorLocation,
    },

    #[error("{operation} timed out after {timeout_ms}ms {location}")]
    Timeout {
        operation: String,
        timeout_ms: u64,
        location: ErrorLocation,
    },

    #[error("Invalid subdomain '{subdomain}' {location}")]
    InvalidSubdomain {
        subdomain: String,
        location: ErrorLocation,
    },

    #[error("Tunnel reported an unusable endpoint '{endpoint}' {location}")]
    InvalidEndpoint {
        endpoint: String,
        location: ErrorLocation,
    },

    #[error("Public access is {status} {location}")]
    NotEnabled {
        status: PublicAccessStatus,
        location: ErrorLocation,
    },
}

impl AccessError {
    #[track_caller]
    pub fn timeout<S: Into<String>>(operation: S, timeout: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms: timeout.as_millis() as u64,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn invalid_subdomain(subdomain: &str) -> Self {
        Self::InvalidSubdomain {
            subdomain: subdomain.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn invalid_endpoint(endpoint: &str) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn not_enabled(status: PublicAccessStatus) -> Self {
        Self::NotEnabled {
            status,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<SupervisorError> for AccessError {
    #[track_caller]
    fn from(source: SupervisorError) -> Self {
        Self::Supervisor {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<DnsError> for AccessError {
    #[track_caller]
    fn from(source: DnsError) -> Self {
        Self::Dns {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<CoreError> for AccessError {
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

pub type Result<T> = std::result::Result<T, AccessError>;
