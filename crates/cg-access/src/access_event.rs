use crate::ProbeResult;

use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccessEvent {
    Enabling {
        subdomain: String,
    },
    Enabled {
        subdomain: String,
        public_url: String,
        endpoint: String,
    },
    EnableFailed {
        subdomain: String,
        error: String,
    },
    Disabled {
        subdomain: Option<String>,
    },
    ConnectivityCheckFailed {
        public_url: String,
        probe: ProbeResult,
    },
    RecoveryAttempted {
        success: bool,
        message: String,
    },
}
