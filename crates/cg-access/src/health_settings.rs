use std::time::Duration;

use cg_config::HealthConfig;

#[derive(Debug, Clone)]
pub struct HealthSettings {
    pub interval: Duration,
    pub failure_threshold: u32,
    pub auto_recovery: bool,
    /// Deadline for each component probe
    pub response_timeout: Duration,
    pub history_retention: Duration,
    pub max_history_entries: usize,
    pub uptime_window: usize,
}

impl HealthSettings {
    pub fn from_config(config: &HealthConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_secs),
            failure_threshold: config.failure_threshold,
            auto_recovery: config.auto_recovery,
            response_timeout: Duration::from_secs(config.response_timeout_secs),
            history_retention: Duration::from_secs(config.history_retention_hours * 3600),
            max_history_entries: config.max_history_entries,
            uptime_window: config.uptime_window,
        }
    }
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self::from_config(&HealthConfig::default())
    }
}
