use crate::tests::server_line;
use crate::{EventKind, OutputStateMachine, ServerStatus};

use googletest::assert_that;
use googletest::prelude::{eq, some};

// =========================================================================
// Lifecycle
// =========================================================================

#[test]
fn given_done_line_when_processed_then_ready_with_startup_time() {
    // Given
    let mut machine = OutputStateMachine::new();

    // When
    let event = machine.process_line(r#"[20:40:13] [Server thread/INFO]: Done (9.123s)! For help, type "help""#);

    // Then
    assert_eq!(
        event.kind,
        EventKind::LifecycleReady {
            startup_time: "9.123s".to_string()
        }
    );
    assert!(event.parsed);
    assert_that!(machine.state().status, eq(ServerStatus::Ready));
    assert!(machine.state().ready_at.is_some());
}

#[test]
fn given_ready_server_when_done_line_repeats_then_ready_at_unchanged() {
    // Given
    let mut machine = OutputStateMachine::new();
    machine.process_line(&server_line(r#"Done (3.2s)! For help, type "help""#));
    let first_ready = machine.state().ready_at;

    // When
    std::thread::sleep(std::time::Duration::from_millis(5));
    machine.process_line(&server_line(r#"Done (3.2s)! For help, type "help""#));

    // Then
    assert_eq!(machine.state().ready_at, first_ready);
}

#[test]
fn given_done_line_when_subscribed_then_exactly_one_ready_event() {
    // Given
    let mut machine = OutputStateMachine::new();
    let mut events = machine.subscribe();

    // When
    machine.process_line(&server_line("Preparing level \"world\""));
    machine.process_line(&server_line(r#"Done (12.5s)! For help, type "help""#));

    // Then
    let mut ready_events = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event.kind, EventKind::LifecycleReady { .. }) {
            ready_events += 1;
        }
    }
    assert_eq!(ready_events, 1);
}

#[test]
fn given_paper_style_prefix_when_done_line_then_ready() {
    // Given
    let mut machine = OutputStateMachine::new();

    // When
    let event = machine.process_line(r#"[12:01:44 INFO]: Done (4.871s)! For help, type "help""#);

    // Then
    assert_that!(event.level.as_deref(), some(eq("INFO")));
    assert_that!(machine.state().status, eq(ServerStatus::Ready));
}

#[test]
fn given_starting_line_when_processed_then_version_captured() {
    // Given
    let mut machine = OutputStateMachine::new();

    // When
    machine.process_line(&server_line("Starting minecraft server version 1.20.4"));

    // Then
    assert_that!(machine.state().status, eq(ServerStatus::Starting));
    assert_that!(machine.state().version.as_deref(), some(eq("1.20.4")));
    assert!(machine.state().started_at.is_some());
}

#[test]
fn given_stopping_line_when_processed_then_stopping() {
    // Given
    let mut machine = OutputStateMachine::new();
    machine.process_line(&server_line(r#"Done (1.0s)! For help, type "help""#));

    // When
    let event = machine.process_line(&server_line("Stopping the server"));

    // Then
    assert_eq!(event.kind, EventKind::LifecycleStopping);
    assert_that!(machine.state().status, eq(ServerStatus::Stopping));
}

// =========================================================================
// Players
// =========================================================================

#[test]
fn given_two_joins_and_one_leave_when_processed_then_player_still_online() {
    // Given
    let mut machine = OutputStateMachine::new();

    // When
    machine.process_line(&server_line("Steve joined the game"));
    machine.process_line(&server_line("Steve joined the game"));
    machine.process_line(&server_line("Steve left the game"));

    // Then
    assert!(machine.state().online_players.contains("Steve"));
    assert_eq!(machine.state().player_count(), 1);
}

#[test]
fn given_joins_matched_by_leaves_when_processed_then_player_offline() {
    // Given
    let mut machine = OutputStateMachine::new();

    // When
    for line in ["Steve joined the game", "Alex joined the game", "Steve left the game"] {
        machine.process_line(&server_line(line));
    }

    // Then
    assert!(!machine.state().online_players.contains("Steve"));
    assert_eq!(machine.state().player_count(), 1);
}

#[test]
fn given_leave_for_absent_player_when_processed_then_noop() {
    // Given
    let mut machine = OutputStateMachine::new();
    machine.process_line(&server_line("Alex joined the game"));

    // When
    let event = machine.process_line(&server_line("Ghost left the game"));

    // Then
    assert_eq!(
        event.kind,
        EventKind::PlayerLeave {
            player: "Ghost".to_string()
        }
    );
    assert_eq!(machine.state().player_count(), 1);
    assert!(machine.state().online_players.contains("Alex"));
}

#[test]
fn given_connection_lost_then_left_when_processed_then_player_removed_once() {
    // Given
    let mut machine = OutputStateMachine::new();
    machine.process_line(&server_line("Alex joined the game"));

    // When
    let event = machine.process_line(&server_line("Alex lost connection: Timed out"));

    // Then
    assert_eq!(
        event.kind,
        EventKind::ConnectionLost {
            player: "Alex".to_string(),
            reason: "Timed out".to_string()
        }
    );
    assert_eq!(machine.state().player_count(), 1);

    machine.process_line(&server_line("Alex left the game"));
    assert_eq!(machine.state().player_count(), 0);
}

#[test]
fn given_list_reply_when_processed_then_roster_replaced() {
    // Given
    let mut machine = OutputStateMachine::new();
    machine.process_line(&server_line("Stale joined the game"));

    // When
    let event = machine.process_line(&server_line(
        "There are 2 of a max of 20 players online: Steve, Alex",
    ));

    // Then
    assert!(matches!(event.kind, EventKind::ServerInfo { .. }));
    let state = machine.state();
    assert_eq!(state.player_count(), 2);
    assert!(state.online_players.contains("Steve"));
    assert!(state.online_players.contains("Alex"));
    assert!(!state.online_players.contains("Stale"));
    assert_that!(state.max_players, some(eq(20)));
}

#[test]
fn given_empty_list_reply_when_processed_then_roster_cleared() {
    // Given
    let mut machine = OutputStateMachine::new();
    machine.process_line(&server_line("Steve joined the game"));

    // When
    machine.process_line(&server_line("There are 0 of a max of 10 players online:"));

    // Then
    assert_eq!(machine.state().player_count(), 0);
}

// =========================================================================
// Classification
// =========================================================================

#[test]
fn given_chat_line_when_processed_then_chat_message() {
    let mut machine = OutputStateMachine::new();

    let event = machine.process_line(&server_line("<Steve> hello there"));

    assert_eq!(
        event.kind,
        EventKind::ChatMessage {
            player: "Steve".to_string(),
            message: "hello there".to_string()
        }
    );
}

#[test]
fn given_unsigned_chat_line_when_processed_then_chat_message() {
    let mut machine = OutputStateMachine::new();

    let event = machine.process_line(&server_line("[Not Secure] <Alex> hi"));

    assert_eq!(
        event.kind,
        EventKind::ChatMessage {
            player: "Alex".to_string(),
            message: "hi".to_string()
        }
    );
}

#[test]
fn given_command_line_when_processed_then_player_command() {
    let mut machine = OutputStateMachine::new();

    let event = machine.process_line(&server_line("Steve issued server command: /tp 0 64 0"));

    assert_eq!(
        event.kind,
        EventKind::PlayerCommand {
            player: "Steve".to_string(),
            command: "/tp 0 64 0".to_string()
        }
    );
}

#[test]
fn given_lag_warning_when_processed_then_figures_passed_through() {
    let mut machine = OutputStateMachine::new();

    let event = machine.process_line(
        "[20:41:00] [Server thread/WARN]: Can't keep up! Is the server overloaded? Running 2503ms or 50 ticks behind",
    );

    assert_eq!(
        event.kind,
        EventKind::PerformanceWarning {
            lag: "2503ms".to_string(),
            ticks: "50".to_string()
        }
    );
}

#[test]
fn given_error_level_when_processed_then_error() {
    let mut machine = OutputStateMachine::new();

    let event = machine.process_line("[20:41:00] [Server thread/ERROR]: Failed to load region file");

    assert!(event.kind.is_error());
    assert_eq!(event.kind.as_str(), "error");
}

#[test]
fn given_stack_trace_head_when_processed_then_exception() {
    let mut machine = OutputStateMachine::new();

    let event = machine.process_line("java.lang.NullPointerException: Cannot invoke method");

    assert_eq!(
        event.kind,
        EventKind::Exception {
            exception: "java.lang.NullPointerException".to_string(),
            message: Some("Cannot invoke method".to_string())
        }
    );
}

#[test]
fn given_save_line_when_processed_then_world_save() {
    let mut machine = OutputStateMachine::new();

    let event = machine.process_line(&server_line("Saving chunks for level 'ServerLevel[world]'/minecraft:overworld"));

    assert_eq!(event.kind.as_str(), "world-save");
}

#[test]
fn given_unmatched_line_when_processed_then_unparsed_info_and_counters_updated() {
    // Given
    let mut machine = OutputStateMachine::new();

    // When
    let event = machine.process_line("some unstructured output");

    // Then
    assert!(!event.parsed);
    assert_eq!(
        event.kind,
        EventKind::Info {
            message: "some unstructured output".to_string()
        }
    );
    assert_eq!(machine.state().message_count, 1);
    assert!(machine.state().last_seen_at.is_some());
}

#[test]
fn given_event_when_serialized_then_kebab_case_tag() {
    let mut machine = OutputStateMachine::new();

    let event = machine.process_line(&server_line("Steve joined the game"));
    let json = serde_json::to_value(&event.kind).unwrap();

    assert_eq!(json["type"], "player-join");
    assert_eq!(json["player"], "Steve");
}

// =========================================================================
// Reset
// =========================================================================

#[test]
fn given_populated_state_when_reset_twice_then_initial_state() {
    // Given
    let mut machine = OutputStateMachine::new();
    machine.process_line(&server_line("Starting minecraft server version 1.20.4"));
    machine.process_line(&server_line("Steve joined the game"));

    // When
    machine.reset_state();
    machine.reset_state();

    // Then
    assert_eq!(*machine.state(), crate::ServerState::default());
}

#[test]
fn given_online_players_when_marked_stopped_then_roster_cleared() {
    // Given
    let mut machine = OutputStateMachine::new();
    machine.process_line(&server_line("Steve joined the game"));

    // When
    machine.mark_stopped();

    // Then
    assert_that!(machine.state().status, eq(ServerStatus::Stopped));
    assert_eq!(machine.state().player_count(), 0);
}
