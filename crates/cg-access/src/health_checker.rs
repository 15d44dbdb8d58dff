use crate::{
    ComponentCheck, EVENT_CHANNEL_CAPACITY, HealthEvent, HealthMetrics, HealthReport,
    HealthSettings, Metrics, OverallHealth, PublicAccessOrchestrator, PublicAccessState,
    RecoveryAction, RecoveryOutcome,
};

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use cg_dns::DnsSynchronizer;
use cg_process::{ProcessStatus, SupervisedProcess};
use chrono::TimeDelta;
use tokio::sync::{Mutex as AsyncMutex, broadcast};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Periodically probes the game server, tunnel, DNS and public
/// connectivity, keeps a bounded history, and runs an ordered recovery
/// cascade once failures persist.
#[derive(Clone)]
pub struct IntegratedHealthChecker {
    inner: Arc<Inner>,
}

struct Inner {
    game_server: Arc<dyn SupervisedProcess>,
    tunnel: Arc<dyn SupervisedProcess>,
    dns: Arc<DnsSynchronizer>,
    access: PublicAccessOrchestrator,
    settings: HealthSettings,
    state: Mutex<CheckerState>,
    /// Overlapping checks (timer tick vs. manual call) run one at a time.
    check: AsyncMutex<()>,
    monitor: Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<HealthEvent>,
    metrics: Metrics,
}

#[derive(Default)]
struct CheckerState {
    consecutive_failures: u32,
    history: VecDeque<HealthReport>,
    metrics: HealthMetrics,
}

impl IntegratedHealthChecker {
    pub fn new(
        game_server: Arc<dyn SupervisedProcess>,
        tunnel: Arc<dyn SupervisedProcess>,
        dns: Arc<DnsSynchronizer>,
        access: PublicAccessOrchestrator,
        settings: HealthSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                game_server,
                tunnel,
                dns,
                access,
                settings,
                state: Mutex::new(CheckerState::default()),
                check: AsyncMutex::new(()),
                monitor: Mutex::new(None),
                events,
                metrics: Metrics::new(),
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HealthEvent> {
        self.inner.events.subscribe()
    }

    pub fn settings(&self) -> &HealthSettings {
        &self.inner.settings
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.inner.state().consecutive_failures
    }

    pub fn metrics(&self) -> HealthMetrics {
        self.inner.state().metrics.clone()
    }

    /// Retained reports, oldest first.
    pub fn history(&self) -> Vec<HealthReport> {
        self.inner.state().history.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<HealthReport> {
        self.inner.state().history.back().cloned()
    }

    /// Run every component probe once, record the report, and run the
    /// recovery cascade if the failure threshold has been reached.
    pub async fn perform_check(&self) -> HealthReport {
        self.inner.perform_check().await
    }

    pub fn is_monitoring(&self) -> bool {
        self.inner
            .monitor()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Start periodic checks. The first check runs immediately. Calling this
    /// while already monitoring does nothing.
    pub fn start_monitoring(&self) {
        let mut monitor = self.inner.monitor();
        if monitor.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("Health monitoring already running");
            return;
        }

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let period = self.inner.settings.interval;
        info!(interval_secs = period.as_secs(), "Starting health monitoring");

        *monitor = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                inner.perform_check().await;
            }
        }));
    }

    /// Stop periodic checks. Calling this while stopped does nothing.
    pub fn stop_monitoring(&self) {
        let handle = self.inner.monitor().take();
        if let Some(handle) = handle {
            handle.abort();
            info!("Health monitoring stopped");
        }
    }
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, CheckerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn monitor(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.monitor.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, event: HealthEvent) {
        let _ = self.events.send(event);
    }

    async fn perform_check(&self) -> HealthReport {
        let _check = self.check.lock().await;
        let started = Instant::now();
        let access = self.access.status();

        let (game_server, tunnel, dns, connectivity) = tokio::join!(
            self.bounded("game server", self.check_game_server()),
            self.bounded("tunnel", self.check_tunnel(&access)),
            self.bounded("dns", self.check_dns(&access)),
            self.bounded("connectivity", self.check_connectivity(&access)),
        );

        let overall =
            OverallHealth::from_components([&game_server, &tunnel, &dns, &connectivity]);
        let elapsed = started.elapsed();

        let report = {
            let mut state = self.state();
            state.consecutive_failures = match overall {
                OverallHealth::Healthy => 0,
                _ => state.consecutive_failures.saturating_add(1),
            };

            let report = HealthReport {
                timestamp: cg_core::now(),
                response_time_ms: elapsed.as_millis() as u64,
                game_server,
                tunnel,
                dns,
                connectivity,
                overall,
                consecutive_failures: state.consecutive_failures,
            };
            self.record(&mut state, &report);
            report
        };

        self.metrics.check_completed(overall, elapsed);
        self.metrics.consecutive_failures(report.consecutive_failures);
        for (name, check) in report.components() {
            self.metrics.component(name, check.health);
        }

        match overall {
            OverallHealth::Healthy => debug!(
                response_time_ms = report.response_time_ms,
                "Health check passed"
            ),
            OverallHealth::Degraded => info!(
                consecutive_failures = report.consecutive_failures,
                "Health check degraded"
            ),
            OverallHealth::Unhealthy | OverallHealth::Error => warn!(
                overall = %overall,
                consecutive_failures = report.consecutive_failures,
                "Health check failed"
            ),
        }

        self.emit(HealthEvent::CheckCompleted {
            report: Box::new(report.clone()),
        });

        if self.settings.auto_recovery
            && overall == OverallHealth::Unhealthy
            && report.consecutive_failures >= self.settings.failure_threshold
        {
            self.recover(&report).await;
            self.state().consecutive_failures = 0;
            self.metrics.consecutive_failures(0);
        }

        report
    }

    /// Append to history, evict by age and count, and refresh rolling metrics.
    fn record(&self, state: &mut CheckerState, report: &HealthReport) {
        state.history.push_back(report.clone());

        if let Ok(retention) = TimeDelta::from_std(self.settings.history_retention)
            && let Some(horizon) = report.timestamp.checked_sub_signed(retention)
        {
            while state
                .history
                .front()
                .is_some_and(|oldest| oldest.timestamp < horizon)
            {
                state.history.pop_front();
            }
        }
        while state.history.len() > self.settings.max_history_entries.max(1) {
            state.history.pop_front();
        }

        let window = self.settings.uptime_window.max(1);
        let recent: Vec<&HealthReport> = state.history.iter().rev().take(window).collect();
        let up = recent.iter().filter(|r| r.overall.is_up()).count();
        let uptime = up as f64 / recent.len() as f64 * 100.0;

        let metrics = &mut state.metrics;
        metrics.total_checks += 1;
        if report.overall.is_up() {
            metrics.successful_checks += 1;
        } else {
            metrics.failed_checks += 1;
        }
        metrics.average_response_time_ms += (report.response_time_ms as f64
            - metrics.average_response_time_ms)
            / metrics.total_checks as f64;
        metrics.uptime_percentage = uptime;
        metrics.last_check_at = Some(report.timestamp);

        self.metrics.uptime(uptime);
    }

    /// A probe that errors or exceeds the response timeout counts as
    /// unhealthy for its component only.
    async fn bounded(
        &self,
        component: &str,
        probe: impl Future<Output = ComponentCheck>,
    ) -> ComponentCheck {
        match tokio::time::timeout(self.settings.response_timeout, probe).await {
            Ok(check) => check,
            Err(_) => {
                warn!(component, "Health probe timed out");
                ComponentCheck::probe_failed(format!(
                    "probe timed out after {}ms",
                    self.settings.response_timeout.as_millis()
                ))
            }
        }
    }

    async fn check_game_server(&self) -> ComponentCheck {
        let record = self.game_server.record();
        match record.status {
            ProcessStatus::Running => match record.pid {
                Some(pid) => ComponentCheck::healthy(format!("running (pid {pid})")),
                None => ComponentCheck::healthy("running"),
            },
            ProcessStatus::Error => ComponentCheck::unhealthy(format!(
                "failed (exit code {:?}, {} restart attempts)",
                record.last_exit_code, record.restart_attempts
            )),
            status => ComponentCheck::not_applicable(status.as_str()),
        }
    }

    async fn check_tunnel(&self, access: &PublicAccessState) -> ComponentCheck {
        let record = self.tunnel.record();

        if !access.is_enabled() {
            return match record.status {
                ProcessStatus::Running => ComponentCheck::healthy("running"),
                ProcessStatus::Error => ComponentCheck::unhealthy("failed"),
                status => ComponentCheck::not_applicable(status.as_str()),
            };
        }

        match (record.status, record.endpoint) {
            (ProcessStatus::Running, Some(endpoint)) => {
                ComponentCheck::healthy(format!("running at {endpoint}"))
            }
            (ProcessStatus::Running, None) => {
                ComponentCheck::unhealthy("running without a public endpoint")
            }
            (status, _) => ComponentCheck::unhealthy(format!("{status} while public access is enabled")),
        }
    }

    async fn check_dns(&self, access: &PublicAccessState) -> ComponentCheck {
        let (Some(public_url), Some(host), true) = (
            access.public_url.as_deref(),
            access.endpoint_host(),
            access.is_enabled(),
        ) else {
            return ComponentCheck::not_applicable("public access disabled");
        };

        match self.dns.verify(public_url, host).await {
            Ok(result) if result.matched => {
                ComponentCheck::healthy(format!("{public_url} resolves to {host}"))
            }
            Ok(result) => ComponentCheck::unhealthy(format!(
                "{public_url} resolves to {:?}, expected {host}",
                result.resolved
            )),
            Err(e) => ComponentCheck::probe_failed(format!("DNS verification failed: {e}")),
        }
    }

    async fn check_connectivity(&self, access: &PublicAccessState) -> ComponentCheck {
        if !access.is_enabled() {
            return ComponentCheck::not_applicable("public access disabled");
        }

        match self.access.test_connectivity().await {
            Ok(probe) if probe.reachable => match probe.latency_ms {
                Some(ms) => ComponentCheck::healthy(format!("reachable in {ms}ms")),
                None => ComponentCheck::healthy("reachable"),
            },
            Ok(probe) => ComponentCheck::unhealthy(
                probe
                    .error
                    .unwrap_or_else(|| String::from("public address unreachable")),
            ),
            Err(e) => ComponentCheck::not_applicable(e.to_string()),
        }
    }

    /// Ordered cascade over the components that were unhealthy in `report`.
    async fn recover(&self, report: &HealthReport) {
        let mut actions = Vec::new();
        if report.game_server.is_unhealthy() {
            actions.push(RecoveryAction::RestartGameServer);
        }
        if report.tunnel.is_unhealthy() {
            actions.push(RecoveryAction::RestartTunnel);
        }
        if (report.dns.is_unhealthy() || report.connectivity.is_unhealthy())
            && self.access.is_enabled()
        {
            actions.push(RecoveryAction::ReenablePublicAccess);
        }

        if actions.is_empty() {
            warn!("Failure threshold reached but no component has a recovery action");
            return;
        }

        warn!(
            consecutive_failures = report.consecutive_failures,
            actions = ?actions,
            "Triggering auto-recovery"
        );
        self.metrics.recovery_triggered();
        self.state().metrics.recoveries_triggered += 1;
        self.emit(HealthEvent::AutoRecoveryTriggered {
            consecutive_failures: report.consecutive_failures,
            actions: actions.clone(),
        });

        let mut outcomes = Vec::with_capacity(actions.len());
        for action in actions {
            let result = self.run_action(action).await;
            let outcome = match result {
                Ok(message) => {
                    info!(action = action.as_str(), "Recovery action succeeded: {message}");
                    RecoveryOutcome {
                        action,
                        success: true,
                        message,
                    }
                }
                Err(message) => {
                    error!(action = action.as_str(), "Recovery action failed: {message}");
                    RecoveryOutcome {
                        action,
                        success: false,
                        message,
                    }
                }
            };
            self.metrics.recovery_action(action, outcome.success);
            outcomes.push(outcome);
        }

        if outcomes.iter().all(|o| o.success) {
            info!("Auto-recovery completed");
            self.emit(HealthEvent::AutoRecoveryCompleted { outcomes });
        } else {
            warn!("Auto-recovery finished with failures");
            self.emit(HealthEvent::AutoRecoveryFailed { outcomes });
        }
    }

    async fn run_action(&self, action: RecoveryAction) -> Result<String, String> {
        match action {
            RecoveryAction::RestartGameServer => self
                .game_server
                .restart()
                .await
                .map(|handle| format!("game server restarted (pid {})", handle.pid))
                .map_err(|e| e.to_string()),
            RecoveryAction::RestartTunnel => self
                .tunnel
                .restart()
                .await
                .map(|handle| format!("tunnel restarted (pid {})", handle.pid))
                .map_err(|e| e.to_string()),
            RecoveryAction::ReenablePublicAccess => {
                let subdomain = self.access.status().subdomain;
                self.access.disable().await.map_err(|e| e.to_string())?;
                self.access
                    .enable(subdomain.as_deref())
                    .await
                    .map(|outcome| format!("public access re-enabled at {}", outcome.public_url))
                    .map_err(|e| e.to_string())
            }
        }
    }
}
