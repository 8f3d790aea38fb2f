use serde::Deserialize;

use super::UtilizationResult;

pub const DEFAULT_CPU_THRESHOLD: f64 = 70.0;
pub const DEFAULT_MEMORY_THRESHOLD: f64 = 70.0;

/// Utilization limits above which a container raises an alert
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    #[serde(rename = "cpu_percent")]
    pub cpu_threshold_percent: f64,
    #[serde(rename = "memory_percent")]
    pub memory_threshold_percent: f64,
}

impl AlertThresholds {
    pub fn new(cpu_threshold_percent: f64, memory_threshold_percent: f64) -> Self {
        Self {
            cpu_threshold_percent,
            memory_threshold_percent,
        }
    }

    /// Compare one pass's utilization against the limits. Strictly greater
    /// than: a value sitting exactly on the limit does not alert.
    pub fn evaluate(&self, utilization: &UtilizationResult) -> AlertDecision {
        AlertDecision {
            cpu_breached: utilization.cpu_percent > self.cpu_threshold_percent,
            memory_breached: utilization.memory_percent > self.memory_threshold_percent,
        }
    }
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self::new(DEFAULT_CPU_THRESHOLD, DEFAULT_MEMORY_THRESHOLD)
    }
}

/// Outcome of a threshold evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlertDecision {
    pub cpu_breached: bool,
    pub memory_breached: bool,
}

impl AlertDecision {
    pub fn should_alert(&self) -> bool {
        self.cpu_breached || self.memory_breached
    }
}
