use std::panic::Location;

use cg_core::CoreError;
use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DnsError {
    #[error("DNS configuration error: {message} {location}")]
    Configuration {
        message: String,
        location: ErrorLocation,
    },

    #[error("DNS provider error (HTTP {status}, code {code}): {message} {location}")]
    ProviderApi {
        status: u16,
        code: i64,
        message: String,
        location: ErrorLocation,
    },

    #[error("HTTP request error: {message} {location}")]
    Http {
        message: String,
        #[source]
        source: reqwest::Error,
        location: ErrorLocation,
    },

    #[error("Unexpected provider response: {message} {location}")]
    InvalidResponse {
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid record: {message} {location}")]
    InvalidRecord {
        message: String,
        location: ErrorLocation,
    },

    #[error("{operation} timed out after {timeout_ms}ms {location}")]
    Timeout {
        operation: String,
        timeout_ms: u64,
        location: ErrorLocation,
    },
}

impl DnsError {
    #[track_caller]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn provider_api<S: Into<String>>(status: u16, code: i64, message: S) -> Self {
        Self::ProviderApi {
            status,
            code,
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn invalid_response<S: Into<String>>(message: S) -> Self {
        Self::InvalidResponse {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn invalid_record<S: Into<String>>(message: S) -> Self {
        Self::InvalidRecord {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Server-side failures, rate limiting and transport failures are worth
    /// another attempt. Other client errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ProviderApi { status, .. } => *status == 429 || *status >= 500,
            Self::Http { source, .. } => {
                source.is_connect() || source.is_timeout() || source.is_request()
            }
            Self::Timeout { .. } => true,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for DnsError {
    #[track_caller]
    fn from(source: reqwest::Error) -> Self {
        Self::Http {
            message: source.to_string(),
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<CoreError> for DnsError {
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

pub type Result<T> = std::result::Result<T, DnsError>;
