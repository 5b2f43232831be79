use serde::{Deserialize, Serialize};

pub const HIGH_THRESHOLD: f64 = 70.0;
pub const MEDIUM_THRESHOLD: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    /// Tier for a heatwave probability in percent. Lower bounds are inclusive;
    /// NaN lands in `Low`.
    pub fn from_percentage(pct: f64) -> Self {
        if pct >= HIGH_THRESHOLD {
            RiskLevel::High
        } else if pct >= MEDIUM_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            RiskLevel::High => "#ff4444",
            RiskLevel::Medium => "#ff8800",
            RiskLevel::Low => "#44ff44",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::High => "HIGH",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::Low => "LOW",
        }
    }
}
