mod rules;
mod tier;

pub use tier::{RiskTier, TierParseError, CRITICAL_SCORE, HIGH_SCORE, MEDIUM_SCORE};

use serde::{Deserialize, Serialize};

use super::domain::NearEarthObject;

/// Points contributed by each independent factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RiskFactors {
    pub hazard: u8,
    pub size: u8,
    pub proximity: u8,
}

impl RiskFactors {
    pub fn total(&self) -> u8 {
        self.hazard + self.size + self.proximity
    }
}

/// Score and tier for one object. Recomputed from scratch on every feed pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: u8,
    pub tier: RiskTier,
    #[serde(default)]
    pub factors: RiskFactors,
}

/// Scores an object with the additive hazard/size/proximity rubric.
///
/// Total over every input: the maximum of each factor (40 + 30 + 30) keeps the
/// score within `[0, 100]`, and non-finite measurements fall into the lowest
/// band of their factor instead of poisoning the sum.
pub fn assess_risk(object: &NearEarthObject) -> RiskAssessment {
    let factors = rules::score_factors(object);
    let score = factors.total();

    RiskAssessment {
        score,
        tier: RiskTier::from_score(score),
        factors,
    }
}
