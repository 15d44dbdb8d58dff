use crate::ProbeResult;

use cg_core::Timestamp;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PublicAccessStatus {
    #[default]
    Disabled,
    Enabling,
    Enabled,
    Disabling,
    /// An enable failed and its cleanup could not be completed.
    Error,
}

impl PublicAccessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Enabling => "enabling",
            Self::Enabled => "enabled",
            Self::Disabling => "disabling",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for PublicAccessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the orchestrator's view of public access.
///
/// `Enabled` always carries a subdomain whose alias record was written.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct PublicAccessState {
    pub status: PublicAccessStatus,
    pub subdomain: Option<String>,
    /// Tunnel endpoint (`host:port`) the records point at
    pub endpoint: Option<String>,
    /// Fully-qualified name players connect to
    pub public_url: Option<String>,
    pub public_port: Option<u16>,
    pub enabled_at: Option<Timestamp>,
    pub last_error: Option<String>,
    pub last_probe: Option<ProbeResult>,
}

impl PublicAccessState {
    pub fn is_enabled(&self) -> bool {
        self.status == PublicAccessStatus::Enabled
    }

    /// Host the alias record targets, taken from the endpoint.
    pub fn endpoint_host(&self) -> Option<&str> {
        self.endpoint
            .as_deref()
            .and_then(|e| e.rsplit_once(':'))
            .map(|(host, _)| host)
    }
}
