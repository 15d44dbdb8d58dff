use crate::DnsRecordType;

use std::net::IpAddr;

use cg_core::Timestamp;
use serde::Serialize;

/// A record this process created and still believes it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManagedDnsRecord {
    pub name: String,
    pub record_type: DnsRecordType,
    pub target: String,
    pub ttl: u32,
    /// Stable across updates
    pub provider_record_id: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Options for a single upsert. `None` falls back to the configured default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertOptions {
    pub ttl: Option<u32>,
    pub proxied: Option<bool>,
}

/// Result of a successful upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordRef {
    pub name: String,
    pub record_type: DnsRecordType,
    pub target: String,
    pub provider_record_id: String,
    /// False when an existing record was updated in place
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyResult {
    pub matched: bool,
    pub resolved: Vec<IpAddr>,
}

/// Snapshot for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsStatus {
    pub base_domain: String,
    pub managed_records: Vec<ManagedDnsRecord>,
}
