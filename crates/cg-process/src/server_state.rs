use std::collections::BTreeSet;

use cg_core::Timestamp;
use serde::Serialize;

/// Lifecycle of the game server as observed from its console.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServerStatus {
    #[default]
    Unknown,
    Starting,
    Ready,
    Stopping,
    Stopped,
}

impl ServerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        }
    }
}

/// Snapshot of everything the console has told us about the server.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct ServerState {
    pub status: ServerStatus,
    pub started_at: Option<Timestamp>,
    pub ready_at: Option<Timestamp>,
    pub version: Option<String>,
    pub online_players: BTreeSet<String>,
    /// Capacity reported by the last `list` reply
    pub max_players: Option<u32>,
    pub last_seen_at: Option<Timestamp>,
    pub message_count: u64,
}

impl ServerState {
    pub fn player_count(&self) -> usize {
        self.online_players.len()
    }

    pub fn is_ready(&self) -> bool {
        self.status == ServerStatus::Ready
    }
}
