use cg_core::Timestamp;
use serde::Serialize;

/// Rolling counters over every check since startup.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct HealthMetrics {
    pub total_checks: u64,
    pub successful_checks: u64,
    pub failed_checks: u64,
    pub average_response_time_ms: f64,
    /// Share of up reports (healthy or degraded) in the recent window
    pub uptime_percentage: f64,
    pub last_check_at: Option<Timestamp>,
    pub recoveries_triggered: u64,
}
