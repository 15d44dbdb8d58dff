use crate::{
    EVENT_CHANNEL_CAPACITY, EventKind, ParsedEvent, ServerState, ServerStatus,
    classifier::{classify, parse_player_list, split_console_line},
};

use std::collections::BTreeMap;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Turns game-server console lines into typed events and a live [`ServerState`].
///
/// The state is mutated synchronously inside [`process_line`](Self::process_line)
/// before the event is published, so a subscriber that reads the state after
/// receiving an event always sees that event applied.
///
/// Joins and leaves are counted per name: a player who joined twice stays
/// online until two leaves have been seen.
pub struct OutputStateMachine {
    state: ServerState,
    sessions: BTreeMap<String, u32>,
    events: broadcast::Sender<ParsedEvent>,
}

impl OutputStateMachine {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: ServerState::default(),
            sessions: BTreeMap::new(),
            events,
        }
    }

    /// Classify one line, apply it to the state, and publish the event.
    pub fn process_line(&mut self, line: &str) -> ParsedEvent {
        let console = split_console_line(line);
        let classified = classify(console.message, console.level);
        let parsed = classified.is_some();
        let kind = classified.unwrap_or_else(|| EventKind::Info {
            message: console.message.to_string(),
        });

        let now = cg_core::now();
        self.state.last_seen_at = Some(now);
        self.state.message_count += 1;
        self.apply(&kind, console.message);

        let event = ParsedEvent {
            kind,
            parsed,
            raw: line.to_string(),
            time: console.time.map(str::to_string),
            thread: console.thread.map(str::to_string),
            level: console.level.map(str::to_string),
            timestamp: now,
        };

        // No subscribers is fine.
        let _ = self.events.send(event.clone());
        event
    }

    fn apply(&mut self, kind: &EventKind, message: &str) {
        match kind {
            EventKind::LifecycleStarting { version } => {
                self.state.status = ServerStatus::Starting;
                self.state.started_at.get_or_insert_with(cg_core::now);
                if version.is_some() {
                    self.state.version = version.clone();
                }
            }
            EventKind::LifecycleReady { startup_time } => {
                if self.state.status != ServerStatus::Ready {
                    self.state.status = ServerStatus::Ready;
                    self.state.ready_at = Some(cg_core::now());
                    info!(startup_time = %startup_time, "Game server is ready");
                }
            }
            EventKind::LifecycleStopping => {
                self.state.status = ServerStatus::Stopping;
            }
            EventKind::PlayerJoin { player } => {
                *self.sessions.entry(player.clone()).or_default() += 1;
                self.state.online_players.insert(player.clone());
                debug!(player = %player, online = self.state.player_count(), "Player joined");
            }
            EventKind::PlayerLeave { player } => self.leave(player),
            EventKind::ServerInfo { .. } => {
                if let Some(list) = parse_player_list(message) {
                    self.sessions = list.players.iter().map(|p| (p.clone(), 1)).collect();
                    self.state.online_players = list.players.into_iter().collect();
                    if list.max.is_some() {
                        self.state.max_players = list.max;
                    }
                }
            }
            EventKind::Error { message } => warn!(message = %message, "Game server error"),
            EventKind::Exception { exception, .. } => {
                warn!(exception = %exception, "Game server exception")
            }
            _ => {}
        }
    }

    fn leave(&mut self, player: &str) {
        let Some(count) = self.sessions.get_mut(player) else {
            return;
        };

        *count -= 1;
        if *count == 0 {
            self.sessions.remove(player);
            self.state.online_players.remove(player);
            debug!(player = %player, online = self.state.player_count(), "Player left");
        }
    }

    pub fn state(&self) -> &ServerState {
        &self.state
    }

    pub fn snapshot(&self) -> ServerState {
        self.state.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ParsedEvent> {
        self.events.subscribe()
    }

    /// Restore every field to its initial value. Safe to call repeatedly.
    pub fn reset_state(&mut self) {
        self.state = ServerState::default();
        self.sessions.clear();
    }

    /// Record that the process behind the console has exited.
    pub fn mark_stopped(&mut self) {
        self.state.status = ServerStatus::Stopped;
        self.state.online_players.clear();
        self.sessions.clear();
    }
}

impl Default for OutputStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
