use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

pub const DEFAULT_API_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

pub const MIN_TTL: u32 = 1;
pub const MAX_TTL: u32 = 86_400;
pub const DEFAULT_TTL: u32 = 60;

pub const MAX_PROPAGATION_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_PROPAGATION_TIMEOUT_SECS: u64 = 60;

pub const MIN_PROPAGATION_INTERVAL_SECS: u64 = 1;
pub const DEFAULT_PROPAGATION_INTERVAL_SECS: u64 = 5;

pub const MIN_REQUEST_TIMEOUT_SECS: u64 = 1;
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// DNS provider credentials and record defaults.
///
/// Credentials are optional here so a config file without secrets still
/// loads; the DNS synchronizer refuses to start without them.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct DnsConfig {
    pub api_token: Option<String>,
    pub zone_id: Option<String>,
    /// Zone apex that subdomains are created under (e.g. "example.com")
    pub base_domain: Option<String>,
    pub api_base_url: String,
    pub default_ttl: u32,
    pub proxied: bool,
    pub propagation_timeout_secs: u64,
    pub propagation_interval_secs: u64,
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for DnsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsConfig")
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("zone_id", &self.zone_id)
            .field("base_domain", &self.base_domain)
            .field("api_base_url", &self.api_base_url)
            .field("default_ttl", &self.default_ttl)
            .field("proxied", &self.proxied)
            .field("propagation_timeout_secs", &self.propagation_timeout_secs)
            .field("propagation_interval_secs", &self.propagation_interval_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            zone_id: None,
            base_domain: None,
            api_base_url: String::from(DEFAULT_API_BASE_URL),
            default_ttl: DEFAULT_TTL,
            proxied: false,
            propagation_timeout_secs: DEFAULT_PROPAGATION_TIMEOUT_SECS,
            propagation_interval_secs: DEFAULT_PROPAGATION_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl DnsConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.default_ttl < MIN_TTL || self.default_ttl > MAX_TTL {
            return Err(ConfigError::dns(format!(
                "dns.default_ttl must be {}-{}, got {}",
                MIN_TTL, MAX_TTL, self.default_ttl
            )));
        }

        if self.propagation_timeout_secs > MAX_PROPAGATION_TIMEOUT_SECS {
            return Err(ConfigError::dns(format!(
                "dns.propagation_timeout_secs must be <= {}, got {}",
                MAX_PROPAGATION_TIMEOUT_SECS, self.propagation_timeout_secs
            )));
        }

        if self.propagation_interval_secs < MIN_PROPAGATION_INTERVAL_SECS {
            return Err(ConfigError::dns(format!(
                "dns.propagation_interval_secs must be >= {}, got {}",
                MIN_PROPAGATION_INTERVAL_SECS, self.propagation_interval_secs
            )));
        }

        if self.request_timeout_secs < MIN_REQUEST_TIMEOUT_SECS
            || self.request_timeout_secs > MAX_REQUEST_TIMEOUT_SECS
        {
            return Err(ConfigError::dns(format!(
                "dns.request_timeout_secs must be {}-{}, got {}",
                MIN_REQUEST_TIMEOUT_SECS, MAX_REQUEST_TIMEOUT_SECS, self.request_timeout_secs
            )));
        }

        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(ConfigError::dns(format!(
                "dns.api_base_url must be an http(s) URL, got '{}'",
                self.api_base_url
            )));
        }

        if let Some(ref domain) = self.base_domain
            && (domain.starts_with('.') || domain.ends_with('.') || !domain.contains('.'))
        {
            return Err(ConfigError::dns(format!(
                "dns.base_domain must be a bare domain like 'example.com', got '{domain}'"
            )));
        }

        Ok(())
    }

    /// True when every credential needed to talk to the provider is present.
    pub fn has_credentials(&self) -> bool {
        [&self.api_token, &self.zone_id, &self.base_domain]
            .iter()
            .all(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}
