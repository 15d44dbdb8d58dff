use crate::{
    ConfigError, ConfigErrorResult, DEFAULT_SERVICE_NAME, DEFAULT_TUNNEL_BINARY,
    DEFAULT_TUNNEL_STARTUP_TIMEOUT_SECS, MAX_STARTUP_TIMEOUT_SECS, MIN_STARTUP_TIMEOUT_SECS,
};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TunnelConfig {
    pub binary_path: String,
    pub args: Vec<String>,
    pub working_directory: Option<String>,
    pub startup_timeout_secs: u64,
    /// Service label used in the `_service._tcp` locator record
    pub service_name: String,
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self {
            binary_path: String::from(DEFAULT_TUNNEL_BINARY),
            args: Vec::new(),
            working_directory: None,
            startup_timeout_secs: DEFAULT_TUNNEL_STARTUP_TIMEOUT_SECS,
            service_name: String::from(DEFAULT_SERVICE_NAME),
        }
    }
}

impl TunnelConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.binary_path.trim().is_empty() {
            return Err(ConfigError::tunnel("tunnel.binary_path cannot be empty"));
        }

        if self.startup_timeout_secs < MIN_STARTUP_TIMEOUT_SECS
            || self.startup_timeout_secs > MAX_STARTUP_TIMEOUT_SECS
        {
            return Err(ConfigError::tunnel(format!(
                "tunnel.startup_timeout_secs must be {}-{}, got {}",
                MIN_STARTUP_TIMEOUT_SECS, MAX_STARTUP_TIMEOUT_SECS, self.startup_timeout_secs
            )));
        }

        let valid_label = !self.service_name.is_empty()
            && self
                .service_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !valid_label {
            return Err(ConfigError::tunnel(format!(
                "tunnel.service_name must be a DNS label, got '{}'",
                self.service_name
            )));
        }

        Ok(())
    }
}
