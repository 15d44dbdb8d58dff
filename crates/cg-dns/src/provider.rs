use crate::{DnsRecord, DnsRecordType, DnsResult, RecordDraft};

use async_trait::async_trait;

/// Record API of a remote DNS provider. Single attempts only; retrying is the
/// synchronizer's job.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// The record with exactly this name whose type belongs to `record_type`.
    async fn find(&self, name: &str, record_type: DnsRecordType) -> DnsResult<Option<DnsRecord>>;

    async fn list(&self, record_type: Option<DnsRecordType>) -> DnsResult<Vec<DnsRecord>>;

    async fn create(&self, draft: &RecordDraft) -> DnsResult<DnsRecord>;

    /// Overwrite the record `id`. The id is unchanged afterwards.
    async fn update(&self, id: &str, draft: &RecordDraft) -> DnsResult<DnsRecord>;

    async fn delete(&self, id: &str) -> DnsResult<()>;
}
