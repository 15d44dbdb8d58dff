use std::time::Duration;

/// What the supervisor does when its process exits unexpectedly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPolicy {
    pub enabled: bool,
    /// Consecutive restarts allowed before giving up
    pub max_attempts: u32,
    /// Fixed delay before each restart
    pub backoff: Duration,
    /// A run that lasted this long resets the attempt counter
    pub stable_after: Duration,
}

impl RestartPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Attempt counter to use after a crash, given how long the run lasted.
    pub fn attempts_after_run(&self, attempts: u32, uptime: Duration) -> u32 {
        if uptime >= self.stable_after { 0 } else { attempts }
    }

    pub fn allows(&self, attempts: u32) -> bool {
        self.enabled && attempts < self.max_attempts
    }
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            backoff: Duration::from_secs(5),
            stable_after: Duration::from_secs(300),
        }
    }
}
