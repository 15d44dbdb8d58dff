use crate::{OutputStream, ProcessStatus};

use serde::Serialize;

/// Lifecycle notifications published by a [`ProcessSupervisor`](crate::ProcessSupervisor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SupervisorEvent {
    StatusChanged {
        name: String,
        from: ProcessStatus,
        to: ProcessStatus,
    },
    Ready {
        name: String,
        pid: u32,
    },
    EndpointDiscovered {
        name: String,
        endpoint: String,
    },
    Exited {
        name: String,
        code: Option<i32>,
        expected: bool,
    },
    Crashed {
        name: String,
        code: Option<i32>,
    },
    Restarting {
        name: String,
        attempt: u32,
        max_attempts: u32,
    },
    RestartExhausted {
        name: String,
        attempts: u32,
    },
    OutputError {
        name: String,
        stream: OutputStream,
        message: String,
    },
}

impl SupervisorEvent {
    pub fn name(&self) -> &str {
        match self {
            Self::StatusChanged { name, .. }
            | Self::Ready { name, .. }
            | Self::EndpointDiscovered { name, .. }
            | Self::Exited { name, .. }
            | Self::Crashed { name, .. }
            | Self::Restarting { name, .. }
            | Self::RestartExhausted { name, .. }
            | Self::OutputError { name, .. } => name,
        }
    }
}
