use crate::{ConfigError, ConfigErrorResult};

use serde::Deserialize;

// Process supervision constraints
pub const MIN_STOP_GRACE_SECS: u64 = 1;
pub const MAX_STOP_GRACE_SECS: u64 = 300;
pub const DEFAULT_STOP_GRACE_SECS: u64 = 30;

pub const MIN_KILL_TIMEOUT_SECS: u64 = 1;
pub const MAX_KILL_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_KILL_TIMEOUT_SECS: u64 = 5;

pub const DEFAULT_RESTART_DELAY_MS: u64 = 2000;
pub const MAX_RESTART_DELAY_MS: u64 = 60_000;

pub const DEFAULT_AUTO_RESTART: bool = true;

pub const MAX_MAX_RESTART_ATTEMPTS: u32 = 20;
pub const DEFAULT_MAX_RESTART_ATTEMPTS: u32 = 3;

pub const MIN_RESTART_BACKOFF_MS: u64 = 100;
pub const MAX_RESTART_BACKOFF_MS: u64 = 300_000;
pub const DEFAULT_RESTART_BACKOFF_MS: u64 = 5000;

pub const DEFAULT_STABLE_AFTER_SECS: u64 = 300;

/// Supervision settings shared by the game server and the tunnel.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// How long a graceful stop may take before the process is killed
    pub stop_grace_secs: u64,
    /// How long to wait for the process to disappear after a kill
    pub kill_timeout_secs: u64,
    /// Pause between the stop and start halves of a restart
    pub restart_delay_ms: u64,
    /// Restart automatically after a non-zero exit
    pub auto_restart: bool,
    pub max_restart_attempts: u32,
    /// Fixed delay before each automatic restart
    pub restart_backoff_ms: u64,
    /// A run this long resets the restart budget
    pub stable_after_secs: u64,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            stop_grace_secs: DEFAULT_STOP_GRACE_SECS,
            kill_timeout_secs: DEFAULT_KILL_TIMEOUT_SECS,
            restart_delay_ms: DEFAULT_RESTART_DELAY_MS,
            auto_restart: DEFAULT_AUTO_RESTART,
            max_restart_attempts: DEFAULT_MAX_RESTART_ATTEMPTS,
            restart_backoff_ms: DEFAULT_RESTART_BACKOFF_MS,
            stable_after_secs: DEFAULT_STABLE_AFTER_SECS,
        }
    }
}

impl ProcessConfig {
    pub fn validate(&self) -> ConfigErrorResult<()> {
        if self.stop_grace_secs < MIN_STOP_GRACE_SECS || self.stop_grace_secs > MAX_STOP_GRACE_SECS
        {
            return Err(ConfigError::config(format!(
                "process.stop_grace_secs must be {}-{}, got {}",
                MIN_STOP_GRACE_SECS, MAX_STOP_GRACE_SECS, self.stop_grace_secs
            )));
        }

        if self.kill_timeout_secs < MIN_KILL_TIMEOUT_SECS
            || self.kill_timeout_secs > MAX_KILL_TIMEOUT_SECS
        {
            return Err(ConfigError::config(format!(
                "process.kill_timeout_secs must be {}-{}, got {}",
                MIN_KILL_TIMEOUT_SECS, MAX_KILL_TIMEOUT_SECS, self.kill_timeout_secs
            )));
        }

        if self.restart_delay_ms > MAX_RESTART_DELAY_MS {
            return Err(ConfigError::config(format!(
                "process.restart_delay_ms must be <= {}, got {}",
                MAX_RESTART_DELAY_MS, self.restart_delay_ms
            )));
        }

        if self.max_restart_attempts > MAX_MAX_RESTART_ATTEMPTS {
            return Err(ConfigError::config(format!(
                "process.max_restart_attempts must be <= {}, got {}",
                MAX_MAX_RESTART_ATTEMPTS, self.max_restart_attempts
            )));
        }

        if self.restart_backoff_ms < MIN_RESTART_BACKOFF_MS
            || self.restart_backoff_ms > MAX_RESTART_BACKOFF_MS
        {
            return Err(ConfigError::config(format!(
                "process.restart_backoff_ms must be {}-{}, got {}",
                MIN_RESTART_BACKOFF_MS, MAX_RESTART_BACKOFF_MS, self.restart_backoff_ms
            )));
        }

        Ok(())
    }
}
