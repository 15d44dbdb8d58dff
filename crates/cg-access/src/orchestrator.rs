use crate::{
    AccessError, AccessEvent, AccessResult, AccessSettings, ConnectivityProbe,
    EVENT_CHANNEL_CAPACITY, Metrics, ProbeResult, PublicAccessState, PublicAccessStatus,
};

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use cg_core::poll_until;
use cg_dns::{DnsRecordType, DnsSynchronizer, ServiceTarget, UpsertOptions};
use cg_process::{ProcessStatus, SupervisedProcess, SupervisorError, parse_endpoint};
use serde::Serialize;
use tokio::sync::{Mutex as AsyncMutex, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Result of a successful (or already satisfied) enable.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnableOutcome {
    pub public_url: String,
    /// Public access was already enabled or enabling; nothing was changed
    pub already_active: bool,
}

/// Sequences tunnel start, endpoint discovery, DNS publication and
/// connectivity probing into enable/disable operations, and watches the
/// public address while enabled.
#[derive(Clone)]
pub struct PublicAccessOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    tunnel: Arc<dyn SupervisedProcess>,
    dns: Arc<DnsSynchronizer>,
    probe: Arc<dyn ConnectivityProbe>,
    settings: AccessSettings,
    state: Mutex<PublicAccessState>,
    /// Serializes enable, disable and recovery passes.
    operation: AsyncMutex<()>,
    monitor: Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<AccessEvent>,
    metrics: Metrics,
}

/// What one publish pass pointed the records at.
struct Published {
    endpoint: String,
    public_url: String,
    port: u16,
}

type RecordKey = (String, DnsRecordType);

impl PublicAccessOrchestrator {
    pub fn new(
        tunnel: Arc<dyn SupervisedProcess>,
        dns: Arc<DnsSynchronizer>,
        probe: Arc<dyn ConnectivityProbe>,
        settings: AccessSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                tunnel,
                dns,
                probe,
                settings,
                state: Mutex::new(PublicAccessState::default()),
                operation: AsyncMutex::new(()),
                monitor: Mutex::new(None),
                events,
                metrics: Metrics::new(),
            }),
        }
    }

    pub fn status(&self) -> PublicAccessState {
        self.inner.state().clone()
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.state().is_enabled()
    }

    pub fn settings(&self) -> &AccessSettings {
        &self.inner.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AccessEvent> {
        self.inner.events.subscribe()
    }

    /// Make the tunnel publicly reachable under `subdomain` (or the
    /// configured default).
    ///
    /// Calling this while already enabled or enabling succeeds without
    /// touching anything. On failure every record created by this call is
    /// removed again and the error that stopped the sequence is returned.
    pub async fn enable(&self, subdomain: Option<&str>) -> AccessResult<EnableOutcome> {
        let inner = &self.inner;
        let subdomain =
            normalize_subdomain(subdomain.unwrap_or(&inner.settings.default_subdomain))?;

        if let Some(outcome) = inner.active_outcome() {
            return Ok(outcome);
        }

        let _operation = inner.operation.lock().await;
        // Status only moves to enabling/enabled under the operation lock.
        if let Some(outcome) = inner.active_outcome() {
            return Ok(outcome);
        }

        // A failed enable that could not clean up keeps its subdomain. Its
        // records go before the state is replaced.
        let stale = {
            let state = inner.state();
            if state.status == PublicAccessStatus::Error {
                state.subdomain.clone()
            } else {
                None
            }
        };
        if let Some(stale) = stale {
            info!(subdomain = %stale, "Removing records left by a failed enable");
            if let Err(e) = inner.remove_records(&stale).await {
                error!(subdomain = %stale, "Failed to remove leftover records: {e}");
                inner.state().last_error = Some(e.to_string());
                return Err(e);
            }
        }

        *inner.state() = PublicAccessState {
            status: PublicAccessStatus::Enabling,
            subdomain: Some(subdomain.clone()),
            ..PublicAccessState::default()
        };

        info!(subdomain = %subdomain, "Enabling public access");
        inner.emit(AccessEvent::Enabling {
            subdomain: subdomain.clone(),
        });

        let mut created = Vec::new();
        let result = inner.publish(&subdomain, &mut created).await;

        match result {
            Ok(published) => {
                let probe = inner.run_probe(&published.public_url, published.port).await;
                if !probe.reachable {
                    warn!(
                        public_url = %published.public_url,
                        port = published.port,
                        "Public address not reachable yet; DNS may still be propagating"
                    );
                }

                *inner.state() = PublicAccessState {
                    status: PublicAccessStatus::Enabled,
                    subdomain: Some(subdomain.clone()),
                    endpoint: Some(published.endpoint.clone()),
                    public_url: Some(published.public_url.clone()),
                    public_port: Some(published.port),
                    enabled_at: Some(cg_core::now()),
                    last_error: None,
                    last_probe: Some(probe),
                };

                info!(
                    public_url = %published.public_url,
                    endpoint = %published.endpoint,
                    "Public access enabled"
                );
                inner.metrics.access_enabled(true);
                inner.emit(AccessEvent::Enabled {
                    subdomain,
                    public_url: published.public_url.clone(),
                    endpoint: published.endpoint,
                });
                inner.spawn_monitor();

                Ok(EnableOutcome {
                    public_url: published.public_url,
                    already_active: false,
                })
            }
            Err(e) => {
                error!(subdomain = %subdomain, "Failed to enable public access: {e}");
                let cleaned = inner.compensate(&created).await;

                {
                    let mut state = inner.state();
                    *state = PublicAccessState {
                        status: if cleaned {
                            PublicAccessStatus::Disabled
                        } else {
                            PublicAccessStatus::Error
                        },
                        subdomain: (!cleaned).then(|| subdomain.clone()),
                        last_error: Some(e.to_string()),
                        ..PublicAccessState::default()
                    };
                }

                inner.metrics.access_enabled(false);
                inner.emit(AccessEvent::EnableFailed {
                    subdomain,
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Stop watching, remove the records for the current subdomain and
    /// return to `Disabled`. Record removal failures are logged; the local
    /// state is always cleared.
    pub async fn disable(&self) -> AccessResult<()> {
        let inner = &self.inner;

        inner.stop_monitor();
        let _operation = inner.operation.lock().await;
        // An enable that held the lock may have started a new monitor.
        inner.stop_monitor();

        let subdomain = {
            let mut state = inner.state();
            if state.status == PublicAccessStatus::Disabled {
                debug!("Public access already disabled");
                return Ok(());
            }
            state.status = PublicAccessStatus::Disabling;
            state.subdomain.clone()
        };

        info!(subdomain = ?subdomain, "Disabling public access");
        if let Some(subdomain) = &subdomain
            && let Err(e) = inner.remove_records(subdomain).await
        {
            warn!(subdomain = %subdomain, "Some DNS records could not be removed: {e}");
        }

        *inner.state() = PublicAccessState::default();
        inner.metrics.access_disabled();
        inner.emit(AccessEvent::Disabled { subdomain });
        info!("Public access disabled");

        Ok(())
    }

    /// Probe the public address once. No recovery is attempted.
    pub async fn test_connectivity(&self) -> AccessResult<ProbeResult> {
        let Some((public_url, port)) = self.inner.public_target() else {
            return Err(AccessError::not_enabled(self.inner.state().status));
        };

        Ok(self.inner.run_probe(&public_url, port).await)
    }

    /// One connectivity-monitor pass: probe, and on failure report it and
    /// optionally attempt recovery.
    pub async fn check_connectivity(&self) {
        self.inner.connectivity_tick().await;
    }
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, PublicAccessState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, event: AccessEvent) {
        let _ = self.events.send(event);
    }

    /// The no-op answer for an enable while enabled or enabling.
    fn active_outcome(&self) -> Option<EnableOutcome> {
        let state = self.state();
        if !matches!(
            state.status,
            PublicAccessStatus::Enabled | PublicAccessStatus::Enabling
        ) {
            return None;
        }

        let subdomain = state.subdomain.as_deref().unwrap_or_default();
        debug!(subdomain, status = %state.status, "Public access already active");
        Some(EnableOutcome {
            public_url: state
                .public_url
                .clone()
                .unwrap_or_else(|| self.dns.qualify(subdomain)),
            already_active: true,
        })
    }

    fn public_target(&self) -> Option<(String, u16)> {
        let state = self.state();
        if !state.is_enabled() {
            return None;
        }
        Some((state.public_url.clone()?, state.public_port?))
    }

    /// Ensure the tunnel runs, then point the records at its endpoint.
    /// Records newly created here are pushed onto `created`.
    async fn publish(
        &self,
        subdomain: &str,
        created: &mut Vec<RecordKey>,
    ) -> AccessResult<Published> {
        let endpoint = self.ensure_tunnel().await?;
        let (host, port) =
            parse_endpoint(&endpoint).ok_or_else(|| AccessError::invalid_endpoint(&endpoint))?;

        let alias = self
            .dns
            .upsert(subdomain, &host, DnsRecordType::Alias, UpsertOptions::default())
            .await?;
        if alias.created {
            created.push((alias.name.clone(), alias.record_type));
        }

        if self.settings.create_service_record {
            let name = self.settings.service_record_name(subdomain);
            let target = ServiceTarget::new(host.as_str(), port).to_string();
            let locator = self
                .dns
                .upsert(
                    &name,
                    &target,
                    DnsRecordType::ServiceLocator,
                    UpsertOptions::default(),
                )
                .await?;
            if locator.created {
                created.push((locator.name, locator.record_type));
            }
        }

        Ok(Published {
            endpoint,
            public_url: self.dns.qualify(subdomain),
            port,
        })
    }

    /// Start the tunnel if needed and wait for its endpoint.
    async fn ensure_tunnel(&self) -> AccessResult<String> {
        let settings = &self.settings;
        let tunnel = &self.tunnel;

        let status = tunnel.record().status;
        if matches!(status, ProcessStatus::Stopped | ProcessStatus::Error) {
            info!(tunnel = tunnel.name(), "Starting tunnel");
            let started =
                tokio::time::timeout(settings.tunnel_start_timeout, tunnel.start()).await;
            match started {
                Ok(Ok(handle)) => debug!(pid = handle.pid, "Tunnel started"),
                Ok(Err(SupervisorError::AlreadyRunning { .. })) => {}
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    return Err(AccessError::timeout(
                        "tunnel start",
                        settings.tunnel_start_timeout,
                    ));
                }
            }
        }

        poll_until(
            "tunnel start",
            settings.endpoint_poll_interval,
            settings.tunnel_start_timeout,
            move || async move { tunnel.record().is_running().then_some(()) },
        )
        .await?;

        let endpoint = poll_until(
            "tunnel endpoint discovery",
            settings.endpoint_poll_interval,
            settings.endpoint_timeout,
            move || async move { tunnel.record().endpoint },
        )
        .await?;

        Ok(endpoint)
    }

    /// Delete the records a failed enable created. Returns false when any
    /// of them could not be removed.
    async fn compensate(&self, created: &[RecordKey]) -> bool {
        let mut cleaned = true;
        for (name, record_type) in created {
            info!(name = %name, record_type = %record_type, "Removing record from failed enable");
            if let Err(e) = self.dns.delete(name, *record_type).await {
                error!(name = %name, "Compensating delete failed: {e}");
                cleaned = false;
            }
        }
        cleaned
    }

    /// Delete the alias (and locator) records for `subdomain`.
    /// Delete every record published for `subdomain`. All deletes are
    /// attempted; the first failure is returned.
    async fn remove_records(&self, subdomain: &str) -> AccessResult<()> {
        let mut records = vec![(subdomain.to_string(), DnsRecordType::Alias)];
        if self.settings.create_service_record {
            records.push((
                self.settings.service_record_name(subdomain),
                DnsRecordType::ServiceLocator,
            ));
        }

        let mut first_error = None;
        for (name, record_type) in records {
            if let Err(e) = self.dns.delete(&name, record_type).await {
                warn!(name = %name, record_type = %record_type, "Failed to delete DNS record: {e}");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    async fn run_probe(&self, host: &str, port: u16) -> ProbeResult {
        let probe = self.probe.probe(host, port).await;
        self.metrics.connectivity(probe.reachable, probe.latency_ms);

        let mut state = self.state();
        if state.public_url.as_deref() == Some(host) {
            state.last_probe = Some(probe.clone());
        }
        probe
    }

    async fn connectivity_tick(&self) {
        let Some((public_url, port)) = self.public_target() else {
            return;
        };

        let probe = self.run_probe(&public_url, port).await;
        if probe.reachable {
            debug!(public_url = %public_url, latency_ms = ?probe.latency_ms, "Connectivity ok");
            return;
        }

        warn!(
            public_url = %public_url,
            port,
            error = ?probe.error,
            "Connectivity check failed"
        );
        self.emit(AccessEvent::ConnectivityCheckFailed {
            public_url,
            probe,
        });

        if !self.settings.auto_recovery {
            return;
        }

        let result = self.recover().await;
        let (success, message) = match result {
            Ok(message) => {
                info!("Connectivity recovery: {message}");
                (true, message)
            }
            Err(e) => {
                warn!("Connectivity recovery failed: {e}");
                (false, e.to_string())
            }
        };
        self.emit(AccessEvent::RecoveryAttempted { success, message });
    }

    /// Restart the tunnel if it is down and re-point the records at its
    /// current endpoint.
    async fn recover(&self) -> AccessResult<String> {
        let _operation = self.operation.lock().await;

        let subdomain = {
            let state = self.state();
            match (&state.subdomain, state.is_enabled()) {
                (Some(subdomain), true) => subdomain.clone(),
                _ => return Ok(String::from("public access no longer enabled")),
            }
        };

        let status = self.tunnel.record().status;
        if matches!(status, ProcessStatus::Stopped | ProcessStatus::Error) {
            warn!(tunnel = self.tunnel.name(), %status, "Restarting tunnel");
            self.tunnel.restart().await?;
        }

        let mut created = Vec::new();
        let published = self.publish(&subdomain, &mut created).await?;

        {
            let mut state = self.state();
            if state.is_enabled() {
                state.endpoint = Some(published.endpoint.clone());
                state.public_port = Some(published.port);
            }
        }

        Ok(format!("records point at {}", published.endpoint))
    }

    fn spawn_monitor(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        let interval = self.settings.connectivity_interval;

        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;

                let Some(inner) = weak.upgrade() else {
                    break;
                };
                if !inner.state().is_enabled() {
                    break;
                }
                inner.connectivity_tick().await;
            }
        });

        let previous = self
            .monitor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    fn stop_monitor(&self) {
        let handle = self
            .monitor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

/// Lower-case, strip a trailing dot, and require every label to be a valid
/// DNS label.
fn normalize_subdomain(raw: &str) -> AccessResult<String> {
    let subdomain = raw.trim().trim_end_matches('.').to_ascii_lowercase();

    let valid = !subdomain.is_empty()
        && subdomain.split('.').all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        });

    if valid {
        Ok(subdomain)
    } else {
        Err(AccessError::invalid_subdomain(raw))
    }
}
