use crate::{HealthReport, RecoveryAction, RecoveryOutcome};

use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HealthEvent {
    CheckCompleted {
        report: Box<HealthReport>,
    },
    AutoRecoveryTriggered {
        consecutive_failures: u32,
        actions: Vec<RecoveryAction>,
    },
    AutoRecoveryCompleted {
        outcomes: Vec<RecoveryOutcome>,
    },
    AutoRecoveryFailed {
        outcomes: Vec<RecoveryOutcome>,
    },
}
