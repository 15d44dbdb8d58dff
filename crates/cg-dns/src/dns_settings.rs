use std::time::Duration;

/// Synchronizer behaviour that does not depend on the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsSettings {
    /// Zone apex that bare labels are qualified with
    pub base_domain: String,
    pub default_ttl: u32,
    pub proxied: bool,
    pub propagation_timeout: Duration,
    pub propagation_interval: Duration,
}

impl DnsSettings {
    pub fn new(base_domain: impl Into<String>) -> Self {
        Self {
            base_domain: base_domain.into(),
            default_ttl: 60,
            proxied: false,
            propagation_timeout: Duration::from_secs(60),
            propagation_interval: Duration::from_secs(5),
        }
    }

    /// Fully qualify `name` under the base domain unless it already is.
    pub fn qualify(&self, name: &str) -> String {
        let name = name.trim().trim_end_matches('.');
        let base = self.base_domain.trim_end_matches('.');

        if name.is_empty() || name == "@" {
            base.to_string()
        } else if name == base || name.ends_with(&format!(".{base}")) {
            name.to_string()
        } else {
            format!("{name}.{base}")
        }
    }
}
