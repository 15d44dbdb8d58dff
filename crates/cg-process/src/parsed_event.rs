use cg_core::Timestamp;
use serde::Serialize;

/// What a single console line meant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum EventKind {
    LifecycleReady { startup_time: String },
    LifecycleStarting { version: Option<String> },
    LifecycleStopping,
    PlayerJoin { player: String },
    PlayerLeave { player: String },
    ChatMessage { player: String, message: String },
    PlayerCommand { player: String, command: String },
    PerformanceWarning { lag: String, ticks: String },
    ConnectionLost { player: String, reason: String },
    Error { message: String },
    Exception {
        exception: String,
        message: Option<String>,
    },
    WorldSave { message: String },
    ServerInfo { message: String },
    /// Line that matched no classifier.
    Info { message: String },
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LifecycleReady { .. } => "lifecycle-ready",
            Self::LifecycleStarting { .. } => "lifecycle-starting",
            Self::LifecycleStopping => "lifecycle-stopping",
            Self::PlayerJoin { .. } => "player-join",
            Self::PlayerLeave { .. } => "player-leave",
            Self::ChatMessage { .. } => "chat-message",
            Self::PlayerCommand { .. } => "player-command",
            Self::PerformanceWarning { .. } => "performance-warning",
            Self::ConnectionLost { .. } => "connection-lost",
            Self::Error { .. } => "error",
            Self::Exception { .. } => "exception",
            Self::WorldSave { .. } => "world-save",
            Self::ServerInfo { .. } => "server-info",
            Self::Info { .. } => "info",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. } | Self::Exception { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedEvent {
    pub kind: EventKind,
    /// False when no classifier matched the line
    pub parsed: bool,
    pub raw: String,
    /// Console clock (`HH:MM:SS`) when the line carried one
    pub time: Option<String>,
    pub thread: Option<String>,
    pub level: Option<String>,
    pub timestamp: Timestamp,
}
