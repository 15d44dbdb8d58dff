mod retry;

use crate::{
    DnsError, DnsProvider, DnsRecord, DnsRecordType, DnsResult, DnsSettings, DnsSynchronizer,
    RecordDraft, Resolver, RetryPolicy,
};

use std::collections::{HashMap, VecDeque};
use std::io;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

/// In-memory provider that counts calls and can be told to fail.
#[derive(Default)]
pub(crate) struct FakeProvider {
    records: Mutex<Vec<DnsRecord>>,
    failures: Mutex<VecDeque<DnsError>>,
    next_id: AtomicU32,
    pub(crate) finds: AtomicU32,
    pub(crate) creates: AtomicU32,
    pub(crate) updates: AtomicU32,
    pub(crate) deletes: AtomicU32,
}

impl FakeProvider {
    /// The next call of any kind fails with `err`.
    pub(crate) fn fail_next(&self, err: DnsError) {
        self.failures.lock().unwrap().push_back(err);
    }

    pub(crate) fn records(&self) -> Vec<DnsRecord> {
        self.records.lock().unwrap().clone()
    }

    pub(crate) fn count(counter: &AtomicU32) -> u32 {
        counter.load(Ordering::SeqCst)
    }

    fn take_failure(&self) -> DnsResult<()> {
        match self.failures.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn to_record(id: String, draft: &RecordDraft) -> DnsRecord {
        DnsRecord {
            id,
            name: draft.name.clone(),
            provider_type: draft.record_type.provider_type(&draft.target).to_string(),
            content: draft.target.clone(),
            ttl: draft.ttl,
            proxied: draft.proxied,
        }
    }
}

#[async_trait]
impl DnsProvider for FakeProvider {
    async fn find(&self, name: &str, record_type: DnsRecordType) -> DnsResult<Option<DnsRecord>> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.name == name && record_type.matches_provider_type(&r.provider_type))
            .cloned())
    }

    async fn list(&self, record_type: Option<DnsRecordType>) -> DnsResult<Vec<DnsRecord>> {
        self.take_failure()?;
        Ok(self
            .records()
            .into_iter()
            .filter(|r| record_type.is_none_or(|t| t.matches_provider_type(&r.provider_type)))
            .collect())
    }

    async fn create(&self, draft: &RecordDraft) -> DnsResult<DnsRecord> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;
        let id = format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let record = Self::to_record(id, draft);
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, draft: &RecordDraft) -> DnsResult<DnsRecord> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;
        let mut records = self.records.lock().unwrap();
        let slot = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| DnsError::provider_api(404, 81044, "Record does not exist"))?;
        *slot = Self::to_record(id.to_string(), draft);
        Ok(slot.clone())
    }

    async fn delete(&self, id: &str) -> DnsResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.take_failure()?;
        self.records.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }
}

/// Resolver backed by a fixed table. Unknown names fail like NXDOMAIN.
#[derive(Default)]
pub(crate) struct FakeResolver {
    table: Mutex<HashMap<String, Vec<IpAddr>>>,
}

impl FakeResolver {
    pub(crate) fn set(&self, name: &str, addresses: &[&str]) {
        let parsed = addresses.iter().map(|a| a.parse().unwrap()).collect();
        self.table.lock().unwrap().insert(name.to_string(), parsed);
    }
}

#[async_trait]
impl Resolver for FakeResolver {
    async fn resolve(&self, name: &str) -> io::Result<Vec<IpAddr>> {
        self.table
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{name}: NXDOMAIN")))
    }
}

pub(crate) fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(1000),
        backoff_multiplier: 2.0,
        max_delay: Duration::from_secs(30),
    }
}

pub(crate) fn synchronizer() -> (DnsSynchronizer, Arc<FakeProvider>, Arc<FakeResolver>) {
    let provider = Arc::new(FakeProvider::default());
    let resolver = Arc::new(FakeResolver::default());
    let sync = DnsSynchronizer::new(
        provider.clone(),
        resolver.clone(),
        DnsSettings::new("example.com"),
        fast_retry(),
    );
    (sync, provider, resolver)
}
