//! Console logging setup.

use crate::{DaemonError, DaemonResult, QUIET_DEPENDENCIES};

use cg_config::LogLevel;
use tracing_subscriber::{
    EnvFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

/// Filter used when `RUST_LOG` is not set.
pub fn default_directives(level: LogLevel) -> String {
    format!("{},{}", level.as_directive(), QUIET_DEPENDENCIES)
}

/// Install the global subscriber: an `EnvFilter` (`RUST_LOG` wins over the
/// configured level) and a human-readable console layer.
///
/// Records emitted through the `log` facade are bridged in as well.
///
/// # Errors
/// `Logging` if a global subscriber is already installed.
pub fn initialize(level: LogLevel) -> DaemonResult<()> {
    let console_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_ansi(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init()
        .map_err(|e| DaemonError::logging(e.to_string()))
}
