//! Keeps provider DNS records in step with locally discovered endpoints.

mod cloudflare_provider;
mod dns_event;
mod dns_record;
mod dns_record_type;
mod dns_settings;
mod error;
mod managed_dns_record;
mod provider;
mod resolver;
mod retry;
mod service_target;
mod synchronizer;

pub use cloudflare_provider::CloudflareProvider;
pub use dns_event::DnsEvent;
pub use dns_record::{DnsRecord, RecordDraft};
pub use dns_record_type::DnsRecordType;
pub use dns_settings::DnsSettings;
pub use error::{DnsError, Result as DnsResult};
pub use managed_dns_record::{DnsStatus, ManagedDnsRecord, RecordRef, UpsertOptions, VerifyResult};
pub use provider::DnsProvider;
pub use resolver::{Resolver, SystemResolver};
pub use retry::{IsRetryable, RetryPolicy, with_retry};
pub use service_target::ServiceTarget;
pub use synchronizer::DnsSynchronizer;

#[cfg(test)]
mod tests;

/// Capacity of the record-change event channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;
