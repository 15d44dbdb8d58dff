use serde::Serialize;

/// Verdict for one component. `NotApplicable` components (for example DNS
/// while public access is off) are left out of the overall ratio.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComponentHealth {
    Healthy,
    Unhealthy,
    NotApplicable,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ComponentCheck {
    pub health: ComponentHealth,
    pub detail: String,
    /// The probe itself failed (error or timeout) rather than reporting a fault
    pub probe_failed: bool,
}

impl ComponentCheck {
    pub fn healthy<S: Into<String>>(detail: S) -> Self {
        Self::with(ComponentHealth::Healthy, detail)
    }

    pub fn unhealthy<S: Into<String>>(detail: S) -> Self {
        Self::with(ComponentHealth::Unhealthy, detail)
    }

    pub fn not_applicable<S: Into<String>>(detail: S) -> Self {
        Self::with(ComponentHealth::NotApplicable, detail)
    }

    pub fn probe_failed<S: Into<String>>(detail: S) -> Self {
        Self {
            probe_failed: true,
            ..Self::unhealthy(detail)
        }
    }

    fn with<S: Into<String>>(health: ComponentHealth, detail: S) -> Self {
        Self {
            health,
            detail: detail.into(),
            probe_failed: false,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.health == ComponentHealth::Healthy
    }

    pub fn is_unhealthy(&self) -> bool {
        self.health == ComponentHealth::Unhealthy
    }
}
