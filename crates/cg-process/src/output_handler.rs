use serde::Serialize;

/// Which pipe a line was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl OutputStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// What the supervisor should do with a line it just handed over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineSignal {
    /// The process reported it is ready to serve
    pub ready: bool,
    /// A `host:port` endpoint the process announced
    pub endpoint: Option<String>,
}

impl LineSignal {
    pub fn ready() -> Self {
        Self {
            ready: true,
            endpoint: None,
        }
    }

    pub fn endpoint(endpoint: String) -> Self {
        Self {
            ready: true,
            endpoint: Some(endpoint),
        }
    }
}

/// Interprets the output of one kind of supervised binary.
///
/// Called from the supervisor's reader tasks, so implementations must be
/// cheap and must not block.
pub trait OutputHandler: Send + Sync + 'static {
    fn handle_line(&self, line: &str, stream: OutputStream) -> LineSignal;

    /// Clear any state derived from a previous run. Called before every launch.
    fn reset(&self);

    /// Called once the process has exited, whatever the reason.
    fn on_exit(&self, code: Option<i32>);

    /// Whether [`handle_line`](Self::handle_line) will ever report readiness.
    /// When false the process counts as running as soon as it is spawned.
    fn signals_readiness(&self) -> bool {
        true
    }
}

/// Handler for processes that have no readiness signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughHandler;

impl OutputHandler for PassthroughHandler {
    fn handle_line(&self, _line: &str, _stream: OutputStream) -> LineSignal {
        LineSignal::default()
    }

    fn reset(&self) {}

    fn on_exit(&self, _code: Option<i32>) {}

    fn signals_readiness(&self) -> bool {
        false
    }
}
