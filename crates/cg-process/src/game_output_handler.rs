use crate::{
    EventKind, LineSignal, OutputHandler, OutputStateMachine, OutputStream, ParsedEvent,
    ServerState,
};

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;

/// Feeds game-server console output through an [`OutputStateMachine`].
///
/// Cloning shares the same state machine, so the supervisor and any reader of
/// the server state observe the same snapshot.
#[derive(Clone, Default)]
pub struct GameOutputHandler {
    machine: Arc<Mutex<OutputStateMachine>>,
}

impl GameOutputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    fn machine(&self) -> MutexGuard<'_, OutputStateMachine> {
        self.machine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> ServerState {
        self.machine().snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ParsedEvent> {
        self.machine().subscribe()
    }

    /// Run a line through the state machine outside of a supervised process.
    pub fn process_line(&self, line: &str) -> ParsedEvent {
        self.machine().process_line(line)
    }
}

impl OutputHandler for GameOutputHandler {
    fn handle_line(&self, line: &str, _stream: OutputStream) -> LineSignal {
        let event = self.machine().process_line(line);

        match event.kind {
            EventKind::LifecycleReady { .. } => LineSignal::ready(),
            _ => LineSignal::default(),
        }
    }

    fn reset(&self) {
        self.machine().reset_state();
    }

    fn on_exit(&self, _code: Option<i32>) {
        self.machine().mark_stopped();
    }
}
