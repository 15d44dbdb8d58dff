use crate::{ComponentHealth, OverallHealth, RecoveryAction};

use std::time::Duration;

use metrics::{counter, gauge, histogram};

/// Metrics emitted by the orchestrator and health checker.
#[derive(Clone)]
pub struct Metrics {
    prefix: &'static str,
}

impl Metrics {
    pub fn new() -> Self {
        Self { prefix: "craftgate" }
    }

    /// Record a finished health check
    pub fn check_completed(&self, overall: OverallHealth, duration: Duration) {
        counter!(format!("{}.health.checks", self.prefix)).increment(1);
        counter!(format!("{}.health.checks.{}", self.prefix, overall.as_str())).increment(1);
        histogram!(format!("{}.health.check_ms", self.prefix)).record(duration.as_millis() as f64);
    }

    /// Record one component verdict (1 healthy, 0 unhealthy, -1 not applicable)
    pub fn component(&self, component: &str, health: ComponentHealth) {
        let value = match health {
            ComponentHealth::Healthy => 1.0,
            ComponentHealth::Unhealthy => 0.0,
            ComponentHealth::NotApplicable => -1.0,
        };
        gauge!(format!("{}.health.component.{}", self.prefix, component)).set(value);
    }

    pub fn consecutive_failures(&self, failures: u32) {
        gauge!(format!("{}.health.consecutive_failures", self.prefix)).set(failures as f64);
    }

    pub fn uptime(&self, percentage: f64) {
        gauge!(format!("{}.health.uptime_percent", self.prefix)).set(percentage);
    }

    /// Record a recovery cascade action
    pub fn recovery_action(&self, action: RecoveryAction, success: bool) {
        let outcome = if success { "succeeded" } else { "failed" };
        counter!(format!(
            "{}.health.recovery.{}.{}",
            self.prefix,
            action.as_str(),
            outcome
        ))
        .increment(1);
    }

    pub fn recovery_triggered(&self) {
        counter!(format!("{}.health.recovery.triggered", self.prefix)).increment(1);
    }

    /// Record public access becoming enabled (or failing to)
    pub fn access_enabled(&self, success: bool) {
        let outcome = if success { "enabled" } else { "enable_failed" };
        counter!(format!("{}.access.{}", self.prefix, outcome)).increment(1);
        if success {
            gauge!(format!("{}.access.active", self.prefix)).set(1.0);
        }
    }

    pub fn access_disabled(&self) {
        counter!(format!("{}.access.disabled", self.prefix)).increment(1);
        gauge!(format!("{}.access.active", self.prefix)).set(0.0);
    }

    /// Record a connectivity probe
    pub fn connectivity(&self, reachable: bool, latency_ms: Option<u64>) {
        if reachable {
            counter!(format!("{}.access.probe.reachable", self.prefix)).increment(1);
        } else {
            counter!(format!("{}.access.probe.unreachable", self.prefix)).increment(1);
        }
        if let Some(latency) = latency_ms {
            histogram!(format!("{}.access.probe.latency_ms", self.prefix)).record(latency as f64);
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
