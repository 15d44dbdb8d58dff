//! Idempotent record management on top of a [`DnsProvider`].

use crate::{
    CloudflareProvider, DnsError, DnsEvent, DnsProvider, DnsRecord, DnsRecordType, DnsResult,
    DnsSettings, DnsStatus, EVENT_CHANNEL_CAPACITY, ManagedDnsRecord, RecordDraft, RecordRef,
    Resolver, RetryPolicy, ServiceTarget, SystemResolver, UpsertOptions, VerifyResult, with_retry,
};

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use cg_config::{DnsConfig, RetryConfig};
use cg_core::poll_until;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

type RecordKey = (String, DnsRecordType);

/// Creates, updates and deletes provider records and remembers the ones it
/// made. The provider stays the source of truth: every operation looks the
/// record up remotely before writing.
pub struct DnsSynchronizer {
    provider: Arc<dyn DnsProvider>,
    resolver: Arc<dyn Resolver>,
    settings: DnsSettings,
    retry: RetryPolicy,
    records: Mutex<BTreeMap<RecordKey, ManagedDnsRecord>>,
    events: broadcast::Sender<DnsEvent>,
}

impl DnsSynchronizer {
    pub fn new(
        provider: Arc<dyn DnsProvider>,
        resolver: Arc<dyn Resolver>,
        settings: DnsSettings,
        retry: RetryPolicy,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            provider,
            resolver,
            settings,
            retry,
            records: Mutex::new(BTreeMap::new()),
            events,
        }
    }

    /// Build against the configured HTTP provider and the system resolver.
    ///
    /// # Errors
    /// `Configuration` when the token, zone id or base domain is missing.
    pub fn from_config(dns: &DnsConfig, retry: &RetryConfig) -> DnsResult<Self> {
        if !dns.has_credentials() {
            return Err(DnsError::configuration(
                "DNS credentials missing: dns.api_token, dns.zone_id and dns.base_domain are required",
            ));
        }
        let Some(base_domain) = dns.base_domain.as_deref() else {
            return Err(DnsError::configuration("dns.base_domain is required"));
        };

        let provider = CloudflareProvider::from_config(dns)?;
        let settings = DnsSettings {
            base_domain: base_domain.trim().to_string(),
            default_ttl: dns.default_ttl,
            proxied: dns.proxied,
            propagation_timeout: Duration::from_secs(dns.propagation_timeout_secs),
            propagation_interval: Duration::from_secs(dns.propagation_interval_secs),
        };

        Ok(Self::new(
            Arc::new(provider),
            Arc::new(SystemResolver),
            settings,
            RetryPolicy::from_config(retry),
        ))
    }

    fn records(&self) -> MutexGuard<'_, BTreeMap<RecordKey, ManagedDnsRecord>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn settings(&self) -> &DnsSettings {
        &self.settings
    }

    pub fn base_domain(&self) -> &str {
        &self.settings.base_domain
    }

    /// Fully qualify `name` under the base domain.
    pub fn qualify(&self, name: &str) -> String {
        self.settings.qualify(name)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DnsEvent> {
        self.events.subscribe()
    }

    /// Create the record, or update it in place if one with this name and
    /// type already exists, then wait (bounded) for it to resolve.
    ///
    /// Propagation that is not observed in time is logged, not returned.
    ///
    /// # Arguments
    /// * `name` - Label or fully-qualified name
    /// * `target` - Host or IP for aliases, `priority weight port host` for service locators
    /// * `record_type` - Which record shape to write
    /// * `options` - TTL and proxy overrides
    pub async fn upsert(
        &self,
        name: &str,
        target: &str,
        record_type: DnsRecordType,
        options: UpsertOptions,
    ) -> DnsResult<RecordRef> {
        let name = self.qualify(name);
        let target = validate_target(target, record_type)?;
        let draft = RecordDraft {
            name: name.clone(),
            record_type,
            target: target.clone(),
            ttl: options.ttl.unwrap_or(self.settings.default_ttl),
            proxied: options.proxied.unwrap_or(self.settings.proxied),
        };

        let provider = &self.provider;
        let (name_ref, draft_ref) = (name.as_str(), &draft);

        let existing = with_retry(&self.retry, "DNS record lookup", move || {
            provider.find(name_ref, record_type)
        })
        .await?;

        let (provider_record_id, created) = match existing {
            Some(existing) => {
                let id = existing.id.as_str();
                with_retry(&self.retry, "DNS record update", move || {
                    provider.update(id, draft_ref)
                })
                .await?;
                (existing.id.clone(), false)
            }
            None => {
                let record = with_retry(&self.retry, "DNS record create", move || {
                    provider.create(draft_ref)
                })
                .await?;
                (record.id, true)
            }
        };

        let managed = self.remember(&draft, &provider_record_id);
        if created {
            info!(name = %name, record_type = %record_type, value = %target, "Created DNS record");
            let _ = self.events.send(DnsEvent::RecordCreated { record: managed });
        } else {
            info!(name = %name, record_type = %record_type, value = %target, "Updated DNS record");
            let _ = self.events.send(DnsEvent::RecordUpdated { record: managed });
        }

        self.await_propagation(&name, &target, record_type).await;

        Ok(RecordRef {
            name,
            record_type,
            target,
            provider_record_id,
            created,
        })
    }

    fn remember(&self, draft: &RecordDraft, provider_record_id: &str) -> ManagedDnsRecord {
        let now = cg_core::now();
        let key = (draft.name.clone(), draft.record_type);
        let mut records = self.records();

        let record = records
            .entry(key)
            .and_modify(|existing| {
                existing.target = draft.target.clone();
                existing.ttl = draft.ttl;
                existing.provider_record_id = provider_record_id.to_string();
                existing.updated_at = now;
            })
            .or_insert_with(|| ManagedDnsRecord {
                name: draft.name.clone(),
                record_type: draft.record_type,
                target: draft.target.clone(),
                ttl: draft.ttl,
                provider_record_id: provider_record_id.to_string(),
                created_at: now,
                updated_at: now,
            });

        record.clone()
    }

    async fn await_propagation(&self, name: &str, target: &str, record_type: DnsRecordType) {
        if record_type == DnsRecordType::ServiceLocator {
            debug!(name, "Service-locator propagation is not observable, skipping check");
            return;
        }

        let operation = format!("DNS propagation of {name}");
        let result = poll_until(
            &operation,
            self.settings.propagation_interval,
            self.settings.propagation_timeout,
            || async move {
                match self.verify(name, target).await {
                    Ok(result) if result.matched => Some(()),
                    _ => None,
                }
            },
        )
        .await;

        match result {
            Ok(()) => info!(name, expected = target, "DNS record propagated"),
            Err(e) => warn!(name, expected = target, "DNS record not yet visible, continuing: {e}"),
        }
    }

    /// Delete the record if it exists. Returns whether anything was removed.
    pub async fn delete(&self, name: &str, record_type: DnsRecordType) -> DnsResult<bool> {
        let name = self.qualify(name);
        let provider = &self.provider;
        let name_ref = name.as_str();

        let existing = with_retry(&self.retry, "DNS record lookup", move || {
            provider.find(name_ref, record_type)
        })
        .await?;

        let Some(existing) = existing else {
            self.records().remove(&(name.clone(), record_type));
            debug!(name = %name, record_type = %record_type, "No DNS record to delete");
            return Ok(false);
        };

        let id = existing.id.as_str();
        with_retry(&self.retry, "DNS record delete", move || provider.delete(id)).await?;

        let record = self
            .records()
            .remove(&(name.clone(), record_type))
            .unwrap_or_else(|| unmanaged(&existing, record_type));

        info!(name = %name, record_type = %record_type, "Deleted DNS record");
        let _ = self.events.send(DnsEvent::RecordDeleted { record });
        Ok(true)
    }

    /// Records currently at the provider, optionally filtered by type.
    pub async fn list(&self, record_type: Option<DnsRecordType>) -> DnsResult<Vec<DnsRecord>> {
        let provider = &self.provider;
        with_retry(&self.retry, "DNS record list", move || provider.list(record_type)).await
    }

    /// One resolution attempt: does `name` currently resolve to `expected`?
    ///
    /// `expected` may be an IP (must be in the resolved set) or a hostname
    /// (its own addresses must overlap the resolved set).
    pub async fn verify(&self, name: &str, expected: &str) -> DnsResult<VerifyResult> {
        let name = self.qualify(name);

        let resolved = match self.resolver.resolve(&name).await {
            Ok(addresses) => addresses,
            Err(e) => {
                debug!(name = %name, "Resolution failed: {e}");
                return Ok(VerifyResult {
                    matched: false,
                    resolved: Vec::new(),
                });
            }
        };

        let expected = expected.trim().trim_end_matches('.');
        let matched = match expected.parse::<IpAddr>() {
            Ok(ip) => resolved.contains(&ip),
            Err(_) => match self.resolver.resolve(expected).await {
                Ok(targets) => targets.iter().any(|ip| resolved.contains(ip)),
                Err(e) => {
                    debug!(expected, "Resolution of expected target failed: {e}");
                    false
                }
            },
        };

        Ok(VerifyResult { matched, resolved })
    }

    /// Delete every managed record, continuing past failures.
    /// Returns how many were removed.
    pub async fn cleanup_all(&self) -> usize {
        let managed = self.managed_records();
        let provider = &self.provider;
        let mut removed = 0;

        for record in managed {
            let id = record.provider_record_id.as_str();
            let result =
                with_retry(&self.retry, "DNS record delete", move || provider.delete(id)).await;

            match result {
                Ok(()) => {
                    self.records()
                        .remove(&(record.name.clone(), record.record_type));
                    info!(name = %record.name, record_type = %record.record_type, "Deleted DNS record");
                    let _ = self.events.send(DnsEvent::RecordDeleted { record });
                    removed += 1;
                }
                Err(e) => {
                    warn!(name = %record.name, "Failed to delete DNS record during cleanup: {e}");
                }
            }
        }

        removed
    }

    pub fn managed_records(&self) -> Vec<ManagedDnsRecord> {
        self.records().values().cloned().collect()
    }

    pub fn managed_record(&self, name: &str, record_type: DnsRecordType) -> Option<ManagedDnsRecord> {
        self.records()
            .get(&(self.qualify(name), record_type))
            .cloned()
    }

    pub fn status(&self) -> DnsStatus {
        DnsStatus {
            base_domain: self.settings.base_domain.clone(),
            managed_records: self.managed_records(),
        }
    }
}

fn validate_target(target: &str, record_type: DnsRecordType) -> DnsResult<String> {
    let target = target.trim().trim_end_matches('.');
    if target.is_empty() {
        return Err(DnsError::invalid_record("record target must not be empty"));
    }

    match record_type {
        DnsRecordType::Alias => Ok(target.to_string()),
        DnsRecordType::ServiceLocator => Ok(target.parse::<ServiceTarget>()?.to_string()),
    }
}

fn unmanaged(record: &DnsRecord, record_type: DnsRecordType) -> ManagedDnsRecord {
    let now = cg_core::now();
    ManagedDnsRecord {
        name: record.name.clone(),
        record_type,
        target: record.content.clone(),
        ttl: record.ttl,
        provider_record_id: record.id.clone(),
        created_at: now,
        updated_at: now,
    }
}
