use crate::{ComponentCheck, ComponentHealth};

use cg_core::Timestamp;
use serde::Serialize;
use std::fmt;

/// Share of applicable components that must be healthy for `Degraded`.
const DEGRADED_RATIO: f64 = 0.75;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OverallHealth {
    Healthy,
    Degraded,
    Unhealthy,
    /// No applicable component could be probed at all
    Error,
}

impl OverallHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
            Self::Error => "error",
        }
    }

    /// Healthy or degraded both count as up.
    pub fn is_up(&self) -> bool {
        matches!(self, Self::Healthy | Self::Degraded)
    }

    /// Aggregate component verdicts: all healthy, at least 75% healthy, or
    /// worse. Components that do not apply are excluded from both sides of
    /// the ratio; with none applicable the result is `Healthy`.
    pub fn from_components<'a>(checks: impl IntoIterator<Item = &'a ComponentCheck>) -> Self {
        let applicable: Vec<&ComponentCheck> = checks
            .into_iter()
            .filter(|c| c.health != ComponentHealth::NotApplicable)
            .collect();

        if applicable.is_empty() {
            return Self::Healthy;
        }
        if applicable.iter().all(|c| c.probe_failed) {
            return Self::Error;
        }

        let healthy = applicable.iter().filter(|c| c.is_healthy()).count();
        let ratio = healthy as f64 / applicable.len() as f64;

        if healthy == applicable.len() {
            Self::Healthy
        } else if ratio >= DEGRADED_RATIO {
            Self::Degraded
        } else {
            Self::Unhealthy
        }
    }
}

impl fmt::Display for OverallHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one health check. Immutable once produced.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HealthReport {
    pub timestamp: Timestamp,
    pub response_time_ms: u64,
    pub game_server: ComponentCheck,
    pub tunnel: ComponentCheck,
    pub dns: ComponentCheck,
    pub connectivity: ComponentCheck,
    pub overall: OverallHealth,
    /// Failure streak including this report
    pub consecutive_failures: u32,
}

impl HealthReport {
    pub fn components(&self) -> [(&'static str, &ComponentCheck); 4] {
        [
            ("game_server", &self.game_server),
            ("tunnel", &self.tunnel),
            ("dns", &self.dns),
            ("connectivity", &self.connectivity),
        ]
    }
}
