use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

pub const DEFAULT_SUBDOMAIN: &str = "play";

pub const MIN_WAIT_SECS: u64 = 1;
pub const MAX_WAIT_SECS: u64 = 600;
pub const DEFAULT_TUNNEL_START_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_ENDPOINT_TIMEOUT_SECS: u64 = 30;

pub const MIN_CONNECTIVITY_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_CONNECTIVITY_INTERVAL_SECS: u64 = 60;

pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublicAccessConfig {
    pub default_subdomain: String,
    /// Enable public access when the daemon boots
    pub enable_on_start: bool,
    pub tunnel_start_timeout_secs: u64,
    pub endpoint_timeout_secs: u64,
    pub connectivity_interval_secs: u64,
    pub probe_timeout_secs: u64,
    /// Attempt one repair pass when a connectivity probe fails
    pub auto_recovery: bool,
    /// Also publish a `_service._tcp` locator record carrying the port
    pub create_service_record: bool,
}

impl Default for PublicAccessConfig {
    fn default() -> Self {
        Self {
            default_subdomain: String::from(DEFAULT_SUBDOMAIN),
            enable_on_start: false,
            tunnel_start_timeout_secs: DEFAULT_TUNNEL_START_TIMEOUT_SECS,
            endpoint_timeout_secs: DEFAULT_ENDPOINT_TIMEOUT_SECS,
            connectivity_interval_secs: DEFAULT_CONNECTIVITY_INTERVAL_SECS,
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            auto_recovery: true,
            create_service_record: true,
        }
    }
}

impl PublicAccessConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        let label = &self.default_subdomain;
        let valid_label = !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !valid_label {
            return Err(ConfigError::config(format!(
                "public_access.default_subdomain must be a DNS label, got '{label}'"
            )));
        }

        for (name, value) in [
            ("tunnel_start_timeout_secs", self.tunnel_start_timeout_secs),
            ("endpoint_timeout_secs", self.endpoint_timeout_secs),
            ("probe_timeout_secs", self.probe_timeout_secs),
        ] {
            if !(MIN_WAIT_SECS..=MAX_WAIT_SECS).contains(&value) {
                return Err(ConfigError::config(format!(
                    "public_access.{name} must be {MIN_WAIT_SECS}-{MAX_WAIT_SECS}, got {value}"
                )));
            }
        }

        if self.connectivity_interval_secs < MIN_CONNECTIVITY_INTERVAL_SECS {
            return Err(ConfigError::config(format!(
                "public_access.connectivity_interval_secs must be >= {}, got {}",
                MIN_CONNECTIVITY_INTERVAL_SECS, self.connectivity_interval_secs
            )));
        }

        Ok(())
    }
}
