use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The two record shapes this system manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DnsRecordType {
    /// Name to host. Written as `A` for an IP target, `CNAME` otherwise.
    Alias,
    /// `SRV` record carrying priority, weight, port and target host.
    ServiceLocator,
}

impl DnsRecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alias => "ALIAS",
            Self::ServiceLocator => "SERVICE_LOCATOR",
        }
    }

    /// Provider record type used to store `target`.
    pub fn provider_type(&self, target: &str) -> &'static str {
        match self {
            Self::Alias if target.parse::<IpAddr>().is_ok() => "A",
            Self::Alias => "CNAME",
            Self::ServiceLocator => "SRV",
        }
    }

    /// Whether a provider record type belongs to this kind.
    pub fn matches_provider_type(&self, provider_type: &str) -> bool {
        match self {
            Self::Alias => matches!(provider_type, "A" | "AAAA" | "CNAME"),
            Self::ServiceLocator => provider_type == "SRV",
        }
    }

    pub fn from_provider_type(provider_type: &str) -> Option<Self> {
        [Self::Alias, Self::ServiceLocator]
            .into_iter()
            .find(|kind| kind.matches_provider_type(provider_type))
    }
}

impl fmt::Display for DnsRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DnsRecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ALIAS" | "A" | "CNAME" => Ok(Self::Alias),
            "SERVICE_LOCATOR" | "SRV" => Ok(Self::ServiceLocator),
            other => Err(format!("unknown record type '{other}'")),
        }
    }
}
