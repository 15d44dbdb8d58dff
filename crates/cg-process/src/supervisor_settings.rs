use std::time::Duration;

/// Timeouts governing one supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorSettings {
    /// How long `start` waits for the readiness signal
    pub startup_timeout: Duration,
    /// How long a graceful stop may take before the process is killed
    pub stop_grace: Duration,
    /// How long to wait for the exit after a kill
    pub kill_timeout: Duration,
    /// Pause between the stop and start halves of a restart
    pub restart_delay: Duration,
    /// Poll interval for status waits
    pub poll_interval: Duration,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            startup_timeout: Duration::from_secs(300),
            stop_grace: Duration::from_secs(30),
            kill_timeout: Duration::from_secs(5),
            restart_delay: Duration::from_secs(2),
            poll_interval: Duration::from_millis(100),
        }
    }
}
