use cg_access::{HealthMetrics, HealthReport, PublicAccessState};
use cg_dns::DnsStatus;
use cg_process::{ProcessRecord, ServerState};
use serde::Serialize;

/// Everything a status display needs in one snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct IntegratedStatus {
    pub game_server: ProcessRecord,
    /// What the console output says about the game server
    pub server_state: ServerState,
    pub tunnel: ProcessRecord,
    pub public_access: PublicAccessState,
    pub dns: DnsStatus,
    pub health: HealthSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthSummary {
    pub monitoring: bool,
    pub consecutive_failures: u32,
    pub latest: Option<HealthReport>,
    pub metrics: HealthMetrics,
}
