use cg_core::Timestamp;
use serde::Serialize;
use std::fmt;

/// Lifecycle of a supervised OS process.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    #[default]
    Stopped,
    Starting,
    Running,
    Stopping,
    Error,
}

impl ProcessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Error => "error",
        }
    }

    /// A child process exists (or is being created or torn down).
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Starting | Self::Running | Self::Stopping)
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of one supervised process.
///
/// `endpoint` is only ever `Some` while `status` is [`ProcessStatus::Running`].
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct ProcessRecord {
    pub name: String,
    pub pid: Option<u32>,
    pub status: ProcessStatus,
    pub started_at: Option<Timestamp>,
    pub endpoint: Option<String>,
    pub restart_attempts: u32,
    pub last_exit_code: Option<i32>,
}

impl ProcessRecord {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == ProcessStatus::Running
    }
}

/// Returned by a successful start.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProcessHandle {
    pub name: String,
    pub pid: u32,
    pub started_at: Timestamp,
    pub endpoint: Option<String>,
}
