use crate::ManagedDnsRecord;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DnsEvent {
    RecordCreated { record: ManagedDnsRecord },
    RecordUpdated { record: ManagedDnsRecord },
    RecordDeleted { record: ManagedDnsRecord },
}
