mod health_report;

use crate::{
    AccessSettings, ConnectivityProbe, HealthSettings, IntegratedHealthChecker, ProbeResult,
    PublicAccessOrchestrator,
};

use std::io;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cg_dns::{
    DnsError, DnsProvider, DnsRecord, DnsRecordType, DnsResult, DnsSettings, DnsSynchronizer,
    RecordDraft, Resolver, RetryPolicy,
};
use cg_process::{
    ProcessHandle, ProcessRecord, ProcessStatus, SupervisedProcess, SupervisorError,
    SupervisorResult,
};

pub(crate) const TUNNEL_ENDPOINT: &str = "host.example:4000";
pub(crate) const BASE_DOMAIN: &str = "example.com";
const RESOLVED_ADDRESS: &str = "203.0.113.7";

pub(crate) fn count(counter: &AtomicU32) -> u32 {
    counter.load(Ordering::SeqCst)
}

// =========================================================================
// Supervised process
// =========================================================================

/// Supervisor stand-in: `start` flips straight to running with the
/// configured endpoint.
pub(crate) struct FakeProcess {
    name: String,
    record: Mutex<ProcessRecord>,
    endpoint: Mutex<Option<String>>,
    fail_start: AtomicBool,
    pub(crate) starts: AtomicU32,
    pub(crate) restarts: AtomicU32,
}

impl FakeProcess {
    pub(crate) fn new(name: &str, endpoint: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            record: Mutex::new(ProcessRecord::new(name)),
            endpoint: Mutex::new(endpoint.map(str::to_string)),
            fail_start: AtomicBool::new(false),
            starts: AtomicU32::new(0),
            restarts: AtomicU32::new(0),
        })
    }

    pub(crate) fn running(name: &str, endpoint: Option<&str>) -> Arc<Self> {
        let process = Self::new(name, endpoint);
        process.launch();
        process
    }

    pub(crate) fn fail_starts(&self) {
        self.fail_start.store(true, Ordering::SeqCst);
    }

    /// Simulate a crash with restarts exhausted.
    pub(crate) fn crash(&self) {
        let mut record = self.record.lock().unwrap();
        record.status = ProcessStatus::Error;
        record.pid = None;
        record.endpoint = None;
        record.last_exit_code = Some(1);
    }

    /// The endpoint the next start reports.
    pub(crate) fn set_endpoint(&self, endpoint: Option<&str>) {
        *self.endpoint.lock().unwrap() = endpoint.map(str::to_string);
    }

    fn launch(&self) -> ProcessHandle {
        let endpoint = self.endpoint.lock().unwrap().clone();
        let mut record = self.record.lock().unwrap();
        let pid = 4000 + count(&self.starts) + count(&self.restarts);
        record.status = ProcessStatus::Running;
        record.pid = Some(pid);
        record.started_at = Some(cg_core::now());
        record.endpoint = endpoint.clone();

        ProcessHandle {
            name: self.name.clone(),
            pid,
            started_at: cg_core::now(),
            endpoint,
        }
    }
}

#[async_trait]
impl SupervisedProcess for FakeProcess {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> SupervisorResult<ProcessHandle> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        let status = self.record.lock().unwrap().status;
        if status.is_active() {
            return Err(SupervisorError::already_running(&self.name, status));
        }
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(SupervisorError::startup_failed(&self.name, "exited during startup"));
        }
        Ok(self.launch())
    }

    async fn stop(&self, _force: bool) -> SupervisorResult<()> {
        let mut record = self.record.lock().unwrap();
        record.status = ProcessStatus::Stopped;
        record.pid = None;
        record.endpoint = None;
        Ok(())
    }

    async fn restart(&self) -> SupervisorResult<ProcessHandle> {
        self.restarts.fetch_add(1, Ordering::SeqCst);
        self.stop(false).await?;
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(SupervisorError::startup_failed(&self.name, "exited during startup"));
        }
        Ok(self.launch())
    }

    fn record(&self) -> ProcessRecord {
        self.record.lock().unwrap().clone()
    }
}

// =========================================================================
// DNS
// =========================================================================

/// In-memory zone. Creates of one provider type can be made to fail.
#[derive(Default)]
pub(crate) struct MemoryProvider {
    records: Mutex<Vec<DnsRecord>>,
    reject_type: Mutex<Option<&'static str>>,
    fail_deletes: AtomicBool,
    next_id: AtomicU32,
    pub(crate) creates: AtomicU32,
    pub(crate) deletes: AtomicU32,
}

impl MemoryProvider {
    pub(crate) fn records(&self) -> Vec<DnsRecord> {
        self.records.lock().unwrap().clone()
    }

    pub(crate) fn reject_creates_of(&self, provider_type: &'static str) {
        *self.reject_type.lock().unwrap() = Some(provider_type);
    }

    pub(crate) fn accept_creates(&self) {
        *self.reject_type.lock().unwrap() = None;
    }

    pub(crate) fn set_failing_deletes(&self, failing: bool) {
        self.fail_deletes.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl DnsProvider for MemoryProvider {
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
        self.creates.fetch_add(1, Ordering::SeqCst);
        let provider_type = draft.record_type.provider_type(&draft.target);
        if *self.reject_type.lock().unwrap() == Some(provider_type) {
            return Err(DnsError::provider_api(400, 1004, "DNS Validation Error"));
        }

        let record = DnsRecord {
            id: format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst)),
            name: draft.name.clone(),
            provider_type: provider_type.to_string(),
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
        record.provider_type = draft.record_type.provider_type(&draft.target).to_string();
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> DnsResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(DnsError::provider_api(403, 10000, "Authentication error"));
        }
        self.records.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }
}

/// Resolves every name to one address unless told to fail.
#[derive(Default)]
pub(crate) struct FakeResolver {
    failing: AtomicBool,
}

impl FakeResolver {
    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Resolver for FakeResolver {
    async fn resolve(&self, name: &str) -> io::Result<Vec<IpAddr>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::NotFound, format!("NXDOMAIN {name}")));
        }
        let address: IpAddr = RESOLVED_ADDRESS
            .parse()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(vec![address])
    }
}

// =========================================================================
// Connectivity
// =========================================================================

pub(crate) struct FakeProbe {
    reachable: AtomicBool,
    pub(crate) probes: AtomicU32,
}

impl FakeProbe {
    pub(crate) fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConnectivityProbe for FakeProbe {
    async fn probe(&self, host: &str, port: u16) -> ProbeResult {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.reachable.load(Ordering::SeqCst) {
            ProbeResult::reachable(Duration::from_millis(12))
        } else {
            ProbeResult::unreachable(format!("connect to {host}:{port} refused"))
        }
    }
}

// =========================================================================
// Harness
// =========================================================================

pub(crate) struct Harness {
    pub(crate) game: Arc<FakeProcess>,
    pub(crate) tunnel: Arc<FakeProcess>,
    pub(crate) provider: Arc<MemoryProvider>,
    pub(crate) resolver: Arc<FakeResolver>,
    pub(crate) probe: Arc<FakeProbe>,
    pub(crate) dns: Arc<DnsSynchronizer>,
    pub(crate) access: PublicAccessOrchestrator,
}

pub(crate) fn access_settings() -> AccessSettings {
    AccessSettings {
        default_subdomain: String::from("play"),
        service_name: String::from("svc"),
        create_service_record: true,
        tunnel_start_timeout: Duration::from_secs(2),
        endpoint_timeout: Duration::from_millis(300),
        endpoint_poll_interval: Duration::from_millis(10),
        connectivity_interval: Duration::from_secs(3600),
        auto_recovery: true,
    }
}

pub(crate) fn health_settings() -> HealthSettings {
    HealthSettings {
        interval: Duration::from_secs(30),
        failure_threshold: 3,
        auto_recovery: true,
        response_timeout: Duration::from_secs(5),
        history_retention: Duration::from_secs(24 * 3600),
        max_history_entries: 100,
        uptime_window: 10,
    }
}

impl Harness {
    /// Game server running, tunnel stopped but reporting `host.example:4000`
    /// once started.
    pub(crate) fn new() -> Self {
        Self::with_settings(access_settings())
    }

    pub(crate) fn with_settings(settings: AccessSettings) -> Self {
        let game = FakeProcess::running("game-server", None);
        let tunnel = FakeProcess::new("tunnel", Some(TUNNEL_ENDPOINT));
        let provider = Arc::new(MemoryProvider::default());
        let resolver = Arc::new(FakeResolver::default());
        let probe = Arc::new(FakeProbe {
            reachable: AtomicBool::new(true),
            probes: AtomicU32::new(0),
        });

        let dns_settings = DnsSettings {
            propagation_timeout: Duration::from_millis(200),
            propagation_interval: Duration::from_millis(50),
            ..DnsSettings::new(BASE_DOMAIN)
        };
        let retry = RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(5),
        };
        let dns = Arc::new(DnsSynchronizer::new(
            provider.clone(),
            resolver.clone(),
            dns_settings,
            retry,
        ));

        let access =
            PublicAccessOrchestrator::new(tunnel.clone(), dns.clone(), probe.clone(), settings);

        Self {
            game,
            tunnel,
            provider,
            resolver,
            probe,
            dns,
            access,
        }
    }

    pub(crate) fn health_checker(&self, settings: HealthSettings) -> IntegratedHealthChecker {
        IntegratedHealthChecker::new(
            self.game.clone(),
            self.tunnel.clone(),
            self.dns.clone(),
            self.access.clone(),
            settings,
        )
    }
}
