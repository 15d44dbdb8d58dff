//! Ordered line classifiers for game-server console output.
//!
//! A console line is split into its `[time] [thread/LEVEL]:` prefix and the
//! message. The message is then tested against each classifier in order and
//! the first match wins.

use crate::EventKind;

use std::sync::LazyLock;

use regex::Regex;

static CONSOLE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"^\[(?P<time>\d{1,2}:\d{2}:\d{2})(?:\s+(?P<plevel>[A-Z]+))?\]:?\s*(?:\[(?P<thread>[^\]/]+)/(?P<level>[A-Z]+)\]:?\s*)?(?:\[(?P<logger>[^\]\s]*[/.][^\]\s]*)\]:?\s*)?(?P<message>.*)$",
    )
});

static READY: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^Done \((?P<time>[^)]+)\)! For help, type"));
static STARTING: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)^starting minecraft server version (?P<version>\S+)"));
static STOPPING: LazyLock<Regex> = LazyLock::new(|| compile(r"^Stopping (?:the )?server"));
static JOIN: LazyLock<Regex> = LazyLock::new(|| compile(r"^(?P<player>\S+) joined the game$"));
static LEAVE: LazyLock<Regex> = LazyLock::new(|| compile(r"^(?P<player>\S+) left the game$"));
static CHAT: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"^(?:\[Not Secure\] )?<(?P<player>[^>\s]+)> (?P<message>.*)$")
});
static COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"^(?P<player>\S+) issued server command: (?P<command>.*)$")
});
static PERFORMANCE: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"Can't keep up! Is the server overloaded\? Running (?P<lag>\d+ms) or (?P<ticks>\d+) ticks behind",
    )
});
static CONNECTION_LOST: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(?P<player>\S+) lost connection: (?P<reason>.*)$"));
static EXCEPTION: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r#"^(?:Exception in thread "[^"]*" )?(?P<class>(?:[A-Za-z_$][\w$]*\.)+[A-Z][\w$]*(?:Exception|Error))(?::\s*(?P<message>.*))?$"#,
    )
});
static WORLD_SAVE: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"^(?:Saving the game|Saved the game|Saving chunks for level '[^']*'|All chunks are saved|All dimensions are saved|ThreadedAnvilChunkStorage)",
    )
});
static SERVER_INFO: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"^(?:Starting Minecraft server on|Preparing level|Preparing start region|Default game type|Loading properties|Generating keypair|Using epoll|Time elapsed|There are \d+ of a max(?: of)? \d+ players online)",
    )
});
static PLAYER_LIST: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"^There are (?P<online>\d+) of a max(?: of)? (?P<max>\d+) players online:?\s*(?P<names>.*)$",
    )
});

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid classifier pattern {pattern}: {e}"))
}

/// A console line split into its prefix fields and message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConsoleLine<'a> {
    pub time: Option<&'a str>,
    pub thread: Option<&'a str>,
    pub level: Option<&'a str>,
    pub message: &'a str,
}

/// Roster carried by the reply to the `list` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlayerList {
    pub max: Option<u32>,
    pub players: Vec<String>,
}

pub(crate) fn split_console_line(line: &str) -> ConsoleLine<'_> {
    let trimmed = line.trim();

    match CONSOLE_PREFIX.captures(trimmed) {
        Some(caps) => {
            let level = caps.name("level").or_else(|| caps.name("plevel"));
            ConsoleLine {
                time: caps.name("time").map(|m| m.as_str()),
                thread: caps.name("thread").map(|m| m.as_str()),
                level: level.map(|m| m.as_str()),
                message: caps.name("message").map_or("", |m| m.as_str().trim()),
            }
        }
        None => ConsoleLine {
            time: None,
            thread: None,
            level: None,
            message: trimmed,
        },
    }
}

/// Classify a console message. `None` means no classifier matched.
pub(crate) fn classify(message: &str, level: Option<&str>) -> Option<EventKind> {
    if let Some(caps) = READY.captures(message) {
        return Some(EventKind::LifecycleReady {
            startup_time: caps["time"].to_string(),
        });
    }
    if let Some(caps) = STARTING.captures(message) {
        return Some(EventKind::LifecycleStarting {
            version: caps.name("version").map(|m| m.as_str().to_string()),
        });
    }
    if STOPPING.is_match(message) {
        return Some(EventKind::LifecycleStopping);
    }
    if let Some(caps) = JOIN.captures(message) {
        return Some(EventKind::PlayerJoin {
            player: caps["player"].to_string(),
        });
    }
    if let Some(caps) = LEAVE.captures(message) {
        return Some(EventKind::PlayerLeave {
            player: caps["player"].to_string(),
        });
    }
    if let Some(caps) = CHAT.captures(message) {
        return Some(EventKind::ChatMessage {
            player: caps["player"].to_string(),
            message: caps["message"].to_string(),
        });
    }
    if let Some(caps) = COMMAND.captures(message) {
        return Some(EventKind::PlayerCommand {
            player: caps["player"].to_string(),
            command: caps["command"].to_string(),
        });
    }
    if let Some(caps) = PERFORMANCE.captures(message) {
        return Some(EventKind::PerformanceWarning {
            lag: caps["lag"].to_string(),
            ticks: caps["ticks"].to_string(),
        });
    }
    if let Some(caps) = CONNECTION_LOST.captures(message) {
        return Some(EventKind::ConnectionLost {
            player: caps["player"].to_string(),
            reason: caps["reason"].to_string(),
        });
    }
    if is_error_level(level) || message.starts_with("ERROR") {
        return Some(EventKind::Error {
            message: message.to_string(),
        });
    }
    if let Some(caps) = EXCEPTION.captures(message) {
        return Some(EventKind::Exception {
            exception: caps["class"].to_string(),
            message: caps
                .name("message")
                .map(|m| m.as_str().to_string())
                .filter(|m| !m.is_empty()),
        });
    }
    if WORLD_SAVE.is_match(message) {
        return Some(EventKind::WorldSave {
            message: message.to_string(),
        });
    }
    if SERVER_INFO.is_match(message) {
        return Some(EventKind::ServerInfo {
            message: message.to_string(),
        });
    }

    None
}

pub(crate) fn parse_player_list(message: &str) -> Option<PlayerList> {
    let caps = PLAYER_LIST.captures(message)?;
    let players = caps
        .name("names")
        .map(|m| m.as_str())
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    Some(PlayerList {
        max: caps["max"].parse().ok(),
        players,
    })
}

fn is_error_level(level: Option<&str>) -> bool {
    matches!(level, Some("ERROR" | "FATAL" | "SEVERE"))
}
