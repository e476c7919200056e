use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::risk::{assess_risk, RiskAssessment, RiskTier};

/// Identifier assigned by the feed provider (the NeoWs `id` field).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NeoId(pub String);

impl NeoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NeoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NeoId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Estimated diameter bounds in kilometers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "DiameterBounds")]
pub struct DiameterRange {
    pub min_km: f64,
    pub max_km: f64,
}

/// Unchecked bounds as they arrive in request bodies.
#[derive(Deserialize)]
struct DiameterBounds {
    min_km: f64,
    max_km: f64,
}

impl From<DiameterBounds> for DiameterRange {
    fn from(bounds: DiameterBounds) -> Self {
        Self::new(bounds.min_km, bounds.max_km)
    }
}

impl DiameterRange {
    /// Builds a range from raw bounds. Negative or non-finite bounds collapse to
    /// zero and swapped bounds are reordered so `min_km <= max_km` always holds.
    pub fn new(min_km: f64, max_km: f64) -> Self {
        let min_km = sanitize_length(min_km);
        let max_km = sanitize_length(max_km);
        if min_km <= max_km {
            Self { min_km, max_km }
        } else {
            Self {
                min_km: max_km,
                max_km: min_km,
            }
        }
    }

    pub fn average_km(&self) -> f64 {
        (self.min_km + self.max_km) / 2.0
    }
}

fn sanitize_length(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// A single pass of the object near a planetary body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseApproach {
    pub date: NaiveDate,
    pub miss_distance_km: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_velocity_kph: Option<f64>,
    pub orbiting_body: String,
}

impl CloseApproach {
    /// Miss distances must be finite and non-negative to be scored or alerted on.
    pub fn has_valid_distance(&self) -> bool {
        self.miss_distance_km.is_finite() && self.miss_distance_km >= 0.0
    }
}

/// Orbit determination summary. Carried for display only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrbitalElements {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orbit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eccentricity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semi_major_axis_au: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inclination_deg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orbital_period_days: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_orbit_intersection_au: Option<f64>,
}

/// Validated view of a feed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearEarthObject {
    pub id: NeoId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nasa_jpl_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub absolute_magnitude: Option<f64>,
    pub is_potentially_hazardous: bool,
    #[serde(default)]
    pub estimated_diameter: DiameterRange,
    #[serde(default)]
    pub close_approaches: Vec<CloseApproach>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orbital_data: Option<OrbitalElements>,
}

impl NearEarthObject {
    /// Approach with the smallest usable miss distance.
    pub fn closest_approach(&self) -> Option<&CloseApproach> {
        self.close_approaches
            .iter()
            .filter(|approach| approach.has_valid_distance())
            .min_by(|left, right| left.miss_distance_km.total_cmp(&right.miss_distance_km))
    }
}

/// Catalog row: the object, its assessment, and when it was last pulled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedAsteroid {
    #[serde(flatten)]
    pub object: NearEarthObject,
    pub risk: RiskAssessment,
    pub last_fetched_at: DateTime<Utc>,
}

impl CachedAsteroid {
    pub fn from_object(object: NearEarthObject, fetched_at: DateTime<Utc>) -> Self {
        let risk = assess_risk(&object);
        Self {
            object,
            risk,
            last_fetched_at: fetched_at,
        }
    }

    pub fn id(&self) -> &NeoId {
        &self.object.id
    }

    pub fn name(&self) -> &str {
        &self.object.name
    }

    pub fn tier(&self) -> RiskTier {
        self.risk.tier
    }

    pub fn score(&self) -> u8 {
        self.risk.score
    }
}
