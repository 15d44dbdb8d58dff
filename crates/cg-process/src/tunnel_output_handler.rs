use crate::{LineSignal, OutputHandler, OutputStream};

use std::sync::{LazyLock, Mutex, MutexGuard};

use regex::Regex;
use tracing::info;

static ENDPOINT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"tcp://(?P<endpoint>[A-Za-z0-9.-]+:\d{1,5})",
        r"(?i)tunnel\b.*\brunning at (?P<endpoint>[A-Za-z0-9.-]+:\d{1,5})",
        r"(?i)\baddress:\s*(?P<endpoint>[A-Za-z0-9.-]+:\d{1,5})",
    ]
    .into_iter()
    .map(|pattern| {
        Regex::new(pattern).unwrap_or_else(|e| panic!("invalid endpoint pattern {pattern}: {e}"))
    })
    .collect()
});

/// Split a `host:port` endpoint. Rejects an empty host and port 0.
pub fn parse_endpoint(endpoint: &str) -> Option<(String, u16)> {
    let (host, port) = endpoint.trim().rsplit_once(':')?;
    let port: u16 = port.parse().ok()?;

    if host.is_empty() || port == 0 {
        return None;
    }

    Some((host.to_string(), port))
}

/// Watches tunnel agent output for the public endpoint it was assigned.
#[derive(Debug, Default)]
pub struct TunnelOutputHandler {
    endpoint: Mutex<Option<String>>,
}

impl TunnelOutputHandler {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> MutexGuard<'_, Option<String>> {
        self.endpoint.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Last endpoint seen in the current run.
    pub fn endpoint(&self) -> Option<String> {
        self.slot().clone()
    }

    fn find_endpoint(line: &str) -> Option<String> {
        ENDPOINT_PATTERNS.iter().find_map(|pattern| {
            let candidate = pattern.captures(line)?.name("endpoint")?.as_str();
            parse_endpoint(candidate).map(|_| candidate.to_string())
        })
    }
}

impl OutputHandler for TunnelOutputHandler {
    fn handle_line(&self, line: &str, _stream: OutputStream) -> LineSignal {
        let Some(endpoint) = Self::find_endpoint(line) else {
            return LineSignal::default();
        };

        let mut slot = self.slot();
        if slot.as_deref() != Some(endpoint.as_str()) {
            info!(endpoint = %endpoint, "Tunnel endpoint discovered");
            *slot = Some(endpoint.clone());
        }

        LineSignal::endpoint(endpoint)
    }

    fn reset(&self) {
        *self.slot() = None;
    }

    fn on_exit(&self, _code: Option<i32>) {
        *self.slot() = None;
    }
}
