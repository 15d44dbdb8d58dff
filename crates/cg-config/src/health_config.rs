use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

pub const MIN_INTERVAL_SECS: u64 = 5;
pub const MAX_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_INTERVAL_SECS: u64 = 30;

pub const MIN_FAILURE_THRESHOLD: u32 = 1;
pub const MAX_FAILURE_THRESHOLD: u32 = 100;
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

pub const MIN_RESPONSE_TIMEOUT_SECS: u64 = 1;
pub const DEFAULT_RESPONSE_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_HISTORY_RETENTION_HOURS: u64 = 24;
pub const DEFAULT_MAX_HISTORY_ENTRIES: usize = 2880;
pub const DEFAULT_UPTIME_WINDOW: usize = 60;

/// Integrated health check settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub interval_secs: u64,
    /// Consecutive failed checks before auto-recovery runs
    pub failure_threshold: u32,
    pub auto_recovery: bool,
    /// Per-probe timeout
    pub response_timeout_secs: u64,
    pub history_retention_hours: u64,
    pub max_history_entries: usize,
    /// Number of most recent reports used for the uptime percentage
    pub uptime_window: usize,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            auto_recovery: true,
            response_timeout_secs: DEFAULT_RESPONSE_TIMEOUT_SECS,
            history_retention_hours: DEFAULT_HISTORY_RETENTION_HOURS,
            max_history_entries: DEFAULT_MAX_HISTORY_ENTRIES,
            uptime_window: DEFAULT_UPTIME_WINDOW,
        }
    }
}

impl HealthConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.interval_secs < MIN_INTERVAL_SECS || self.interval_secs > MAX_INTERVAL_SECS {
            return Err(ConfigError::health(format!(
                "health.interval_secs must be {}-{}, got {}",
                MIN_INTERVAL_SECS, MAX_INTERVAL_SECS, self.interval_secs
            )));
        }

        if self.failure_threshold < MIN_FAILURE_THRESHOLD
            || self.failure_threshold > MAX_FAILURE_THRESHOLD
        {
            return Err(ConfigError::health(format!(
                "health.failure_threshold must be {}-{}, got {}",
                MIN_FAILURE_THRESHOLD, MAX_FAILURE_THRESHOLD, self.failure_threshold
            )));
        }

        // A probe must be able to time out before the next tick starts.
        if self.response_timeout_secs < MIN_RESPONSE_TIMEOUT_SECS
            || self.response_timeout_secs >= self.interval_secs
        {
            return Err(ConfigError::health(format!(
                "health.response_timeout_secs must be >= {} and below health.interval_secs ({}), got {}",
                MIN_RESPONSE_TIMEOUT_SECS, self.interval_secs, self.response_timeout_secs
            )));
        }

        if self.history_retention_hours == 0 || self.max_history_entries == 0 {
            return Err(ConfigError::health(
                "health.history_retention_hours and health.max_history_entries must be > 0",
            ));
        }

        if self.uptime_window == 0 {
            return Err(ConfigError::health("health.uptime_window must be > 0"));
        }

        Ok(())
    }
}
