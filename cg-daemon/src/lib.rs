//! Wires the supervisors, DNS synchronizer, public access and health checking
//! into one `Platform` that front ends drive.

pub mod logging;

mod error;
mod integrated_status;
mod operation_outcome;
mod platform;

pub use error::{DaemonError, Result as DaemonResult};
pub use integrated_status::{HealthSummary, IntegratedStatus};
pub use operation_outcome::OperationOutcome;
pub use platform::Platform;

#[cfg(test)]
mod tests;

/// Process name used for the game server supervisor and its log fields.
const GAME_SERVER_NAME: &str = "game-server";

/// Process name used for the tunnel agent supervisor.
const TUNNEL_NAME: &str = "tunnel";

/// Directives appended to the configured level to quiet HTTP client internals.
const QUIET_DEPENDENCIES: &str = "hyper=warn,hyper_util=warn,reqwest=warn";
