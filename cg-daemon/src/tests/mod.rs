mod platform;

use crate::Platform;

use std::io;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cg_config::Config;
use cg_dns::{
    DnsError, DnsProvider, DnsRecord, DnsRecordType, DnsResult, DnsSettings, DnsSynchronizer,
    RecordDraft, Resolver, RetryPolicy,
};

pub(crate) const BASE_DOMAIN: &str = "example.com";

/// In-memory zone standing in for the HTTP provider.
#[derive(Default)]
pub(crate) struct MemoryZone {
    records: Mutex<Vec<DnsRecord>>,
    next_id: AtomicU32,
}

impl MemoryZone {
    pub(crate) fn records(&self) -> Vec<DnsRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl DnsProvider for MemoryZone {
    async fn find(&self, name: &str, record_type: DnsRecordType) -> DnsResult<Option<DnsRecord>> {
        Ok(self
            .records()
            .into_iter()
            .find(|r| r.name == name && record_type.matches_provider_type(&r.provider_type)))
    }

    async fn list(&self, record_type: Option<DnsRecordType>) -> DnsResult<Vec<DnsRecord>> {
        Ok(self
            .records()
            .into_iter()
            .filter(|r| record_type.is_none_or(|t| t.matches_provider_type(&r.provider_type)))
            .collect())
    }

    async fn create(&self, draft: &RecordDraft) -> DnsResult<DnsRecord> {
        let record = DnsRecord {
            id: format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            name: draft.name.clone(),
            provider_type: draft.record_type.provider_type(&draft.target).to_string(),
            content: draft.target.clone(),
            ttl: draft.ttl,
            proxied: draft.proxied,
        };
        self.records.lock().unwrap().push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: &str, draft: &RecordDraft) -> DnsResult<DnsRecord> {
        let mut records = self.records.lock().unwrap();
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            return Err(DnsError::provider_api(404, 81044, "Record does not exist."));
        };
        record.content = draft.target.clone();
        record.ttl = draft.ttl;
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> DnsResult<()> {
        self.records.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }
}

struct LoopbackResolver;

#[async_trait]
impl Resolver for LoopbackResolver {
    async fn resolve(&self, _name: &str) -> io::Result<Vec<IpAddr>> {
        Ok(vec![IpAddr::from([127, 0, 0, 1])])
    }
}

/// Defaults tightened so stops and DNS waits finish quickly.
pub(crate) fn test_config() -> Config {
    let mut config = Config::default();
    config.game_server.java_path = String::from("/nonexistent/bin/java");
    config.game_server.startup_timeout_secs = 5;
    config.tunnel.binary_path = String::from("/nonexistent/bin/tunnel");
    config.process.stop_grace_secs = 2;
    config.process.kill_timeout_secs = 1;
    config.process.restart_delay_ms = 50;
    config.process.auto_restart = false;
    config
}

pub(crate) fn build_platform(config: &Config) -> (Platform, Arc<MemoryZone>) {
    let zone = Arc::new(MemoryZone::default());
    let settings = DnsSettings {
        propagation_timeout: Duration::from_millis(100),
        propagation_interval: Duration::from_millis(20),
        ..DnsSettings::new(BASE_DOMAIN)
    };
    let retry = RetryPolicy {
        max_attempts: 1,
        base_delay: Duration::from_millis(1),
        backoff_multiplier: 2.0,
        max_delay: Duration::from_millis(1),
    };
    let dns = DnsSynchronizer::new(zone.clone(), Arc::new(LoopbackResolver), settings, retry);

    (Platform::new(config, Arc::new(dns)), zone)
}
