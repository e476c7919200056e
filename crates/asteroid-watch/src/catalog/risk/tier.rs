use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const CRITICAL_SCORE: u8 = 80;
pub const HIGH_SCORE: u8 = 60;
pub const MEDIUM_SCORE: u8 = 40;

/// Discrete classification derived from a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskTier {
    pub const fn from_score(score: u8) -> Self {
        if score >= CRITICAL_SCORE {
            RiskTier::Critical
        } else if score >= HIGH_SCORE {
            RiskTier::High
        } else if score >= MEDIUM_SCORE {
            RiskTier::Medium
        } else {
            RiskTier::Low
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
            RiskTier::Critical => "CRITICAL",
        }
    }

    /// Tiers that trigger catalog-wide alerts.
    pub const fn is_high_risk(self) -> bool {
        matches!(self, RiskTier::High | RiskTier::Critical)
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown risk tier '{0}'")]
pub struct TierParseError(pub String);

impl FromStr for RiskTier {
    type Err = TierParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(RiskTier::Low),
            "MEDIUM" => Ok(RiskTier::Medium),
            "HIGH" => Ok(RiskTier::High),
            "CRITICAL" => Ok(RiskTier::Critical),
            _ => Err(TierParseError(value.to_string())),
        }
    }
}
