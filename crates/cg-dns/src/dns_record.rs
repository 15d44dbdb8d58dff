use crate::DnsRecordType;

use serde::Serialize;

/// A record as the provider reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsRecord {
    pub id: String,
    pub name: String,
    /// Provider record type (`A`, `CNAME`, `SRV`, ...)
    pub provider_type: String,
    /// Record value. Service-locator records use the `priority weight port host` form.
    pub content: String,
    pub ttl: u32,
    pub proxied: bool,
}

impl DnsRecord {
    pub fn record_type(&self) -> Option<DnsRecordType> {
        DnsRecordType::from_provider_type(&self.provider_type)
    }
}

/// What to write for a create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    pub name: String,
    pub record_type: DnsRecordType,
    pub target: String,
    pub ttl: u32,
    pub proxied: bool,
}
