use serde::Serialize;

/// Steps of the auto-recovery cascade, in execution order.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    RestartGameServer,
    RestartTunnel,
    ReenablePublicAccess,
}

impl RecoveryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RestartGameServer => "restart_game_server",
            Self::RestartTunnel => "restart_tunnel",
            Self::ReenablePublicAccess => "reenable_public_access",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecoveryOutcome {
    pub action: RecoveryAction,
    pub success: bool,
    pub message: String,
}
