//! Public access (tunnel + DNS) orchestration and integrated health checking.

mod access_event;
mod access_settings;
mod component_check;
mod connectivity_probe;
mod error;
mod health_checker;
mod health_event;
mod health_metrics;
mod health_report;
mod health_settings;
mod metrics;
mod orchestrator;
mod public_access_state;
mod recovery_action;

pub use access_event::AccessEvent;
pub use access_settings::AccessSettings;
pub use component_check::{ComponentCheck, ComponentHealth};
pub use connectivity_probe::{ConnectivityProbe, ProbeResult, TcpProbe};
pub use error::{AccessError, Result as AccessResult};
pub use health_checker::IntegratedHealthChecker;
pub use health_event::HealthEvent;
pub use health_metrics::HealthMetrics;
pub use health_report::{HealthReport, OverallHealth};
pub use health_settings::HealthSettings;
pub use metrics::Metrics;
pub use orchestrator::{EnableOutcome, PublicAccessOrchestrator};
pub use public_access_state::{PublicAccessState, PublicAccessStatus};
pub use recovery_action::{RecoveryAction, RecoveryOutcome};

#[cfg(test)]
mod tests;

/// Capacity of the access and health event channels.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Interval between endpoint checks while waiting on the tunnel.
const ENDPOINT_POLL_INTERVAL_MS: u64 = 250;
