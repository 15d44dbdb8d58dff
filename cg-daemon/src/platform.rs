//! The outbound surface front ends call: one object owning every component.

use crate::{
    DaemonResult, GAME_SERVER_NAME, HealthSummary, IntegratedStatus, OperationOutcome, TUNNEL_NAME,
};

use std::sync::Arc;
use std::time::Duration;

use cg_access::{
    AccessEvent, AccessSettings, HealthEvent, HealthReport, HealthSettings,
    IntegratedHealthChecker, PublicAccessOrchestrator, PublicAccessState, PublicAccessStatus,
    TcpProbe,
};
use cg_config::{Config, GameServerConfig, ProcessConfig, TunnelConfig};
use cg_dns::{DnsEvent, DnsRecordType, DnsStatus, DnsSynchronizer, ServiceTarget, UpsertOptions};
use cg_process::{
    GameOutputHandler, ParsedEvent, ProcessSpec, ProcessSupervisor, RestartPolicy,
    SupervisorError, SupervisorEvent, SupervisorSettings, TunnelOutputHandler, parse_endpoint,
};
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Game server, tunnel, DNS, public access and health checking, wired
/// together from one [`Config`].
pub struct Platform {
    game_server: ProcessSupervisor,
    game_output: GameOutputHandler,
    tunnel: ProcessSupervisor,
    dns: Arc<DnsSynchronizer>,
    access: PublicAccessOrchestrator,
    health: IntegratedHealthChecker,
}

impl Platform {
    /// Build every component from configuration.
    ///
    /// # Errors
    /// `Dns` when the provider credentials are missing or the HTTP client
    /// cannot be built.
    pub fn from_config(config: &Config) -> DaemonResult<Self> {
        let dns = DnsSynchronizer::from_config(&config.dns, &config.retry)?;
        Ok(Self::new(config, Arc::new(dns)))
    }

    /// Build the platform around an existing DNS synchronizer.
    pub fn new(config: &Config, dns: Arc<DnsSynchronizer>) -> Self {
        let policy = restart_policy(&config.process);

        let game_output = GameOutputHandler::new();
        let game_server = ProcessSupervisor::new(
            game_server_spec(&config.game_server),
            Arc::new(game_output.clone()),
            supervisor_settings(&config.process, config.game_server.startup_timeout_secs),
            policy,
        );

        let tunnel = ProcessSupervisor::new(
            tunnel_spec(&config.tunnel),
            Arc::new(TunnelOutputHandler::new()),
            supervisor_settings(&config.process, config.tunnel.startup_timeout_secs),
            policy,
        );

        let probe = TcpProbe::new(Duration::from_secs(config.public_access.probe_timeout_secs));
        let access = PublicAccessOrchestrator::new(
            Arc::new(tunnel.clone()),
            Arc::clone(&dns),
            Arc::new(probe),
            AccessSettings::from_config(&config.public_access, &config.tunnel),
        );

        let health = IntegratedHealthChecker::new(
            Arc::new(game_server.clone()),
            Arc::new(tunnel.clone()),
            Arc::clone(&dns),
            access.clone(),
            HealthSettings::from_config(&config.health),
        );

        Self {
            game_server,
            game_output,
            tunnel,
            dns,
            access,
            health,
        }
    }

    // =========================================================================
    // Game server
    // =========================================================================

    pub async fn start_server(&self) -> OperationOutcome {
        match self.game_server.start(None).await {
            Ok(handle) => OperationOutcome::success(format!(
                "Game server started (pid {})",
                handle.pid
            )),
            Err(e) => supervisor_failure("start the game server", &e),
        }
    }

    /// Stop the game server; `force` skips the stop command and kills it.
    pub async fn stop_server(&self, force: bool) -> OperationOutcome {
        match self.game_server.stop(force).await {
            Ok(()) => OperationOutcome::success("Game server stopped"),
            Err(e) => supervisor_failure("stop the game server", &e),
        }
    }

    pub async fn restart_server(&self) -> OperationOutcome {
        match self.game_server.restart().await {
            Ok(handle) => OperationOutcome::success(format!(
                "Game server restarted (pid {})",
                handle.pid
            )),
            Err(e) => supervisor_failure("restart the game server", &e),
        }
    }

    /// Write one console command to the game server.
    pub async fn send_command(&self, command: &str) -> OperationOutcome {
        let command = command.trim();
        if command.is_empty() {
            return OperationOutcome::failure("Command cannot be empty");
        }

        match self.game_server.send_line(command).await {
            Ok(()) => OperationOutcome::success(format!("Sent '{command}'")),
            Err(e) => supervisor_failure("send the command", &e),
        }
    }

    // =========================================================================
    // Public access
    // =========================================================================

    pub async fn enable_public_access(&self, subdomain: Option<&str>) -> OperationOutcome {
        match self.access.enable(subdomain).await {
            Ok(outcome) if outcome.already_active => OperationOutcome::success(format!(
                "Public access is already enabled at {}",
                outcome.public_url
            )),
            Ok(outcome) => OperationOutcome::success(format!(
                "Public access enabled at {}",
                outcome.public_url
            )),
            Err(e) => {
                warn!("Enabling public access failed: {e}");
                OperationOutcome::failure(format!("Failed to enable public access: {e}"))
            }
        }
    }

    pub async fn disable_public_access(&self) -> OperationOutcome {
        match self.access.disable().await {
            Ok(()) => OperationOutcome::success("Public access disabled"),
            Err(e) => {
                warn!("Disabling public access failed: {e}");
                OperationOutcome::failure(format!("Failed to disable public access: {e}"))
            }
        }
    }

    pub fn public_access_status(&self) -> PublicAccessState {
        self.access.status()
    }

    /// Probe the published endpoint once.
    pub async fn test_connectivity(&self) -> OperationOutcome {
        let probe = match self.access.test_connectivity().await {
            Ok(probe) => probe,
            Err(e) => return OperationOutcome::failure(format!("Cannot test connectivity: {e}")),
        };

        let endpoint = self.access.status().endpoint.unwrap_or_default();
        match (probe.reachable, probe.latency_ms) {
            (true, Some(latency)) => {
                OperationOutcome::success(format!("{endpoint} reachable in {latency}ms"))
            }
            (true, None) => OperationOutcome::success(format!("{endpoint} reachable")),
            (false, _) => OperationOutcome::failure(format!(
                "{endpoint} unreachable: {}",
                probe.error.as_deref().unwrap_or("no response")
            )),
        }
    }

    // =========================================================================
    // DNS
    // =========================================================================

    /// Create or update one record.
    ///
    /// Without a `target` the record points at the tunnel's current endpoint:
    /// its host for an alias, `0 0 <port> <host>` for a service locator.
    pub async fn update_dns_record(
        &self,
        name: &str,
        target: Option<&str>,
        record_type: DnsRecordType,
    ) -> OperationOutcome {
        let target = match target {
            Some(target) => target.to_string(),
            None => match self.tunnel_target(record_type) {
                Some(target) => target,
                None => {
                    return OperationOutcome::failure(
                        "No target given and the tunnel has not reported an endpoint",
                    );
                }
            },
        };

        let result = self
            .dns
            .upsert(name, &target, record_type, UpsertOptions::default())
            .await;

        match result {
            Ok(record) => {
                let verb = if record.created { "Created" } else { "Updated" };
                OperationOutcome::success(format!(
                    "{verb} {} record {} -> {}",
                    record.record_type, record.name, record.target
                ))
            }
            Err(e) => {
                warn!(record = name, "DNS update failed: {e}");
                OperationOutcome::failure(format!("Failed to update {name}: {e}"))
            }
        }
    }

    pub async fn remove_dns_record(&self, name: &str, record_type: DnsRecordType) -> OperationOutcome {
        let fqdn = self.dns.qualify(name);
        match self.dns.delete(name, record_type).await {
            Ok(true) => OperationOutcome::success(format!("Removed {record_type} record {fqdn}")),
            Ok(false) => OperationOutcome::success(format!(
                "No {record_type} record for {fqdn}, nothing to remove"
            )),
            Err(e) => {
                warn!(record = %fqdn, "DNS removal failed: {e}");
                OperationOutcome::failure(format!("Failed to remove {fqdn}: {e}"))
            }
        }
    }

    pub fn dns_status(&self) -> DnsStatus {
        self.dns.status()
    }

    fn tunnel_target(&self, record_type: DnsRecordType) -> Option<String> {
        let endpoint = self.tunnel.endpoint()?;
        let (host, port) = parse_endpoint(&endpoint)?;
        Some(match record_type {
            DnsRecordType::Alias => host,
            DnsRecordType::ServiceLocator => ServiceTarget::new(host, port).to_string(),
        })
    }

    // =========================================================================
    // Health and status
    // =========================================================================

    pub fn start_health_monitoring(&self) {
        self.health.start_monitoring();
    }

    pub fn stop_health_monitoring(&self) {
        self.health.stop_monitoring();
    }

    /// Run one health check now, outside the monitoring schedule.
    pub async fn check_health(&self) -> HealthReport {
        self.health.perform_check().await
    }

    pub fn integrated_status(&self) -> IntegratedStatus {
        IntegratedStatus {
            game_server: self.game_server.record(),
            server_state: self.game_output.state(),
            tunnel: self.tunnel.record(),
            public_access: self.access.status(),
            dns: self.dns.status(),
            health: HealthSummary {
                monitoring: self.health.is_monitoring(),
                consecutive_failures: self.health.consecutive_failures(),
                latest: self.health.latest(),
                metrics: self.health.metrics(),
            },
        }
    }

    // =========================================================================
    // Event streams
    // =========================================================================

    /// Game server lifecycle transitions.
    pub fn subscribe_game_server(&self) -> broadcast::Receiver<SupervisorEvent> {
        self.game_server.subscribe()
    }

    /// Player joins and leaves, server errors and the rest of the parsed console.
    pub fn subscribe_server_output(&self) -> broadcast::Receiver<ParsedEvent> {
        self.game_output.subscribe()
    }

    pub fn subscribe_tunnel(&self) -> broadcast::Receiver<SupervisorEvent> {
        self.tunnel.subscribe()
    }

    pub fn subscribe_dns(&self) -> broadcast::Receiver<DnsEvent> {
        self.dns.subscribe()
    }

    pub fn subscribe_public_access(&self) -> broadcast::Receiver<AccessEvent> {
        self.access.subscribe()
    }

    /// Check completions and auto-recovery progress.
    pub fn subscribe_health(&self) -> broadcast::Receiver<HealthEvent> {
        self.health.subscribe()
    }

    // =========================================================================
    // Shutdown
    // =========================================================================

    /// Tear down in reverse start order: monitoring, public access, tunnel,
    /// game server. Failures are logged and do not stop the sequence.
    pub async fn shutdown(&self) {
        info!("Shutting down");
        self.health.stop_monitoring();

        if self.access.status().status != PublicAccessStatus::Disabled {
            if let Err(e) = self.access.disable().await {
                warn!("Failed to disable public access during shutdown: {e}");
            }
        }

        if let Err(e) = self.tunnel.stop(false).await {
            warn!(process = TUNNEL_NAME, "Failed to stop during shutdown: {e}");
        }

        if let Err(e) = self.game_server.stop(false).await {
            warn!(process = GAME_SERVER_NAME, "Failed to stop during shutdown: {e}");
        }

        info!("Shutdown complete");
    }
}

fn supervisor_failure(action: &str, error: &SupervisorError) -> OperationOutcome {
    warn!("Failed to {action}: {error}");
    OperationOutcome::failure(format!(
        "Failed to {action}: {error}. {}",
        error.recovery_hint()
    ))
}

fn game_server_spec(config: &GameServerConfig) -> ProcessSpec {
    let spec = ProcessSpec::new(GAME_SERVER_NAME, &config.java_path)
        .with_args(config.launch_args())
        .with_working_dir(config.directory_path());

    match config.stop_command.trim() {
        "" => spec,
        command => spec.with_stop_command(command),
    }
}

fn tunnel_spec(config: &TunnelConfig) -> ProcessSpec {
    let spec = ProcessSpec::new(TUNNEL_NAME, &config.binary_path).with_args(&config.args);

    match config.working_directory.as_deref() {
        Some(dir) => spec.with_working_dir(dir),
        None => spec,
    }
}

fn supervisor_settings(config: &ProcessConfig, startup_timeout_secs: u64) -> SupervisorSettings {
    SupervisorSettings {
        startup_timeout: Duration::from_secs(startup_timeout_secs),
        stop_grace: Duration::from_secs(config.stop_grace_secs),
        kill_timeout: Duration::from_secs(config.kill_timeout_secs),
        restart_delay: Duration::from_millis(config.restart_delay_ms),
        ..SupervisorSettings::default()
    }
}

fn restart_policy(config: &ProcessConfig) -> RestartPolicy {
    RestartPolicy {
        enabled: config.auto_restart,
        max_attempts: config.max_restart_attempts,
        backoff: Duration::from_millis(config.restart_backoff_ms),
        stable_after: Duration::from_secs(config.stable_after_secs),
    }
}
