use std::time::Duration;

use cg_config::{PublicAccessConfig, TunnelConfig};

/// Orchestrator timings and record options.
#[derive(Debug, Clone)]
pub struct AccessSettings {
    pub default_subdomain: String,
    /// Service label for the `_service._tcp` locator record
    pub service_name: String,
    pub create_service_record: bool,
    pub tunnel_start_timeout: Duration,
    pub endpoint_timeout: Duration,
    pub endpoint_poll_interval: Duration,
    pub connectivity_interval: Duration,
    pub auto_recovery: bool,
}

impl AccessSettings {
    pub fn from_config(access: &PublicAccessConfig, tunnel: &TunnelConfig) -> Self {
        Self {
            default_subdomain: access.default_subdomain.clone(),
            service_name: tunnel.service_name.clone(),
            create_service_record: access.create_service_record,
            tunnel_start_timeout: Duration::from_secs(access.tunnel_start_timeout_secs),
            endpoint_timeout: Duration::from_secs(access.endpoint_timeout_secs),
            endpoint_poll_interval: Duration::from_millis(crate::ENDPOINT_POLL_INTERVAL_MS),
            connectivity_interval: Duration::from_secs(access.connectivity_interval_secs),
            auto_recovery: access.auto_recovery,
        }
    }

    /// Locator record label for `subdomain`, e.g. `_minecraft._tcp.play`.
    pub fn service_record_name(&self, subdomain: &str) -> String {
        format!("_{}._tcp.{}", self.service_name, subdomain)
    }
}

impl Default for AccessSettings {
    fn default() -> Self {
        Self::from_config(&PublicAccessConfig::default(), &TunnelConfig::default())
    }
}
