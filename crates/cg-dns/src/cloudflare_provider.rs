use crate::{
    DnsError, DnsProvider, DnsRecord, DnsRecordType, DnsResult, RecordDraft, ServiceTarget,
};

use std::time::Duration;

use async_trait::async_trait;
use cg_config::DnsConfig;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

/// Records requested per page when listing or searching.
const PAGE_SIZE: &str = "100";

/// Client for the Cloudflare v4 DNS records API (or anything speaking it).
pub struct CloudflareProvider {
    base_url: String,
    zone_id: String,
    api_token: String,
    client: ReqwestClient,
}

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct ApiRecord {
    id: String,
    #[serde(rename = "type")]
    record_type: String,
    name: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    ttl: u32,
    #[serde(default)]
    proxied: Option<bool>,
    #[serde(default)]
    data: Option<SrvData>,
}

#[derive(Deserialize, Serialize)]
struct SrvData {
    priority: u16,
    weight: u16,
    port: u16,
    target: String,
}

impl From<ApiRecord> for DnsRecord {
    fn from(record: ApiRecord) -> Self {
        let content = match (&record.data, record.record_type.as_str()) {
            (Some(data), "SRV") => ServiceTarget {
                priority: data.priority,
                weight: data.weight,
                port: data.port,
                host: data.target.trim_end_matches('.').to_string(),
            }
            .to_string(),
            _ => record.content,
        };

        Self {
            id: record.id,
            name: record.name,
            provider_type: record.record_type,
            content,
            ttl: record.ttl,
            proxied: record.proxied.unwrap_or(false),
        }
    }
}

impl CloudflareProvider {
    /// Create a provider client.
    ///
    /// # Arguments
    /// * `base_url` - API root (e.g., "https://api.cloudflare.com/client/v4")
    /// * `zone_id` - Zone the records live in
    /// * `api_token` - Token with DNS edit permission for the zone
    /// * `request_timeout` - Per-request timeout
    pub fn new(
        base_url: &str,
        zone_id: &str,
        api_token: &str,
        request_timeout: Duration,
    ) -> DnsResult<Self> {
        let client = ReqwestClient::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| DnsError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            zone_id: zone_id.to_string(),
            api_token: api_token.to_string(),
            client,
        })
    }

    /// Build from configuration, failing when credentials are missing.
    pub fn from_config(config: &DnsConfig) -> DnsResult<Self> {
        let token = required(config.api_token.as_deref(), "dns.api_token")?;
        let zone_id = required(config.zone_id.as_deref(), "dns.zone_id")?;

        Self::new(
            &config.api_base_url,
            zone_id,
            token,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn records_url(&self) -> String {
        format!("{}/zones/{}/dns_records", self.base_url, self.zone_id)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url).bearer_auth(&self.api_token)
    }

    fn url(&self, suffix: &str, params: &[(&str, &str)]) -> DnsResult<Url> {
        let raw = format!("{}{}", self.records_url(), suffix);
        let parsed = if params.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, params)
        };
        parsed.map_err(|e| DnsError::configuration(format!("invalid provider URL '{raw}': {e}")))
    }

    /// Execute request and unwrap the response envelope
    async fn execute<T: DeserializeOwned>(&self, req: RequestBuilder) -> DnsResult<Option<T>> {
        let response = req.send().await?;
        let status = response.status();
        let body = response.text().await?;

        let envelope: Option<Envelope<T>> = serde_json::from_str(&body).ok();

        match envelope {
            Some(envelope) if status.is_success() && envelope.success => Ok(envelope.result),
            Some(envelope) => {
                let (code, message) = envelope
                    .errors
                    .into_iter()
                    .next()
                    .map(|e| (e.code, e.message))
                    .unwrap_or_else(|| (0, reason(status)));
                Err(DnsError::provider_api(status.as_u16(), code, message))
            }
            None if status.is_success() => Err(DnsError::invalid_response(format!(
                "could not parse provider response body: {}",
                truncate(&body)
            ))),
            None => Err(DnsError::provider_api(
                status.as_u16(),
                0,
                format!("{}: {}", reason(status), truncate(&body)),
            )),
        }
    }

    fn body(draft: &RecordDraft) -> DnsResult<Value> {
        let provider_type = draft.record_type.provider_type(&draft.target);

        match draft.record_type {
            DnsRecordType::Alias => Ok(json!({
                "type": provider_type,
                "name": draft.name,
                "content": draft.target,
                "ttl": draft.ttl,
                "proxied": draft.proxied,
            })),
            DnsRecordType::ServiceLocator => {
                let target: ServiceTarget = draft.target.parse()?;
                let data = SrvData {
                    priority: target.priority,
                    weight: target.weight,
                    port: target.port,
                    target: target.host,
                };
                Ok(json!({
                    "type": provider_type,
                    "name": draft.name,
                    "ttl": draft.ttl,
                    "data": data,
                }))
            }
        }
    }

    fn expect_record(record: Option<ApiRecord>) -> DnsResult<DnsRecord> {
        record
            .map(DnsRecord::from)
            .ok_or_else(|| DnsError::invalid_response("provider returned no record"))
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn find(&self, name: &str, record_type: DnsRecordType) -> DnsResult<Option<DnsRecord>> {
        let url = self.url("", &[("name", name), ("per_page", PAGE_SIZE)])?;
        let records: Vec<ApiRecord> = self
            .execute(self.request(Method::GET, url))
            .await?
            .unwrap_or_default();

        Ok(records
            .into_iter()
            .map(DnsRecord::from)
            .find(|r| r.name == name && record_type.matches_provider_type(&r.provider_type)))
    }

    async fn list(&self, record_type: Option<DnsRecordType>) -> DnsResult<Vec<DnsRecord>> {
        let url = self.url("", &[("per_page", PAGE_SIZE)])?;
        let records: Vec<ApiRecord> = self
            .execute(self.request(Method::GET, url))
            .await?
            .unwrap_or_default();

        Ok(records
            .into_iter()
            .map(DnsRecord::from)
            .filter(|r| record_type.is_none_or(|t| t.matches_provider_type(&r.provider_type)))
            .collect())
    }

    async fn create(&self, draft: &RecordDraft) -> DnsResult<DnsRecord> {
        let body = Self::body(draft)?;
        let url = self.url("", &[])?;
        debug!(name = %draft.name, "Creating DNS record");

        let record = self.execute(self.request(Method::POST, url).json(&body)).await?;
        Self::expect_record(record)
    }

    async fn update(&self, id: &str, draft: &RecordDraft) -> DnsResult<DnsRecord> {
        let body = Self::body(draft)?;
        let url = self.url(&format!("/{id}"), &[])?;
        debug!(name = %draft.name, id, "Updating DNS record");

        let record = self.execute(self.request(Method::PUT, url).json(&body)).await?;
        Self::expect_record(record)
    }

    async fn delete(&self, id: &str) -> DnsResult<()> {
        let url = self.url(&format!("/{id}"), &[])?;
        debug!(id, "Deleting DNS record");

        match self.execute::<Value>(self.request(Method::DELETE, url)).await {
            Ok(_) => Ok(()),
            Err(DnsError::ProviderApi { status: 404, .. }) => {
                debug!(id, "DNS record already gone");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> DnsResult<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DnsError::configuration(format!("{field} is required")))
}

fn reason(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("Unknown status")
        .to_string()
}

fn truncate(body: &str) -> String {
    body.chars().take(200).collect()
}
