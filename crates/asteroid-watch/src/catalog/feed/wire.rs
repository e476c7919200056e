//! NeoWs wire format and its conversion into validated domain records.
//!
//! The feed encodes most measurements as decimal strings. Every one of them
//! goes through [`parse_measure`] so malformed values surface as explicit
//! errors here instead of leaking NaN into scoring.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use tracing::warn;

use super::super::domain::{
    CloseApproach, DiameterRange, NearEarthObject, NeoId, OrbitalElements,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeasureParseError {
    #[error("measurement is empty")]
    Empty,
    #[error("measurement '{0}' is not a number")]
    NotNumeric(String),
    #[error("measurement '{0}' is negative")]
    Negative(String),
}

/// Parses a non-negative, finite decimal measurement.
pub fn parse_measure(raw: &str) -> Result<f64, MeasureParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(MeasureParseError::Empty);
    }

    let value: f64 = trimmed
        .parse()
        .map_err(|_| MeasureParseError::NotNumeric(trimmed.to_string()))?;
    if !value.is_finite() {
        return Err(MeasureParseError::NotNumeric(trimmed.to_string()));
    }
    if value < 0.0 {
        return Err(MeasureParseError::Negative(trimmed.to_string()));
    }

    Ok(value)
}

/// Response of `GET /feed`.
#[derive(Debug, Deserialize)]
pub struct NeoWsFeed {
    #[serde(default)]
    pub element_count: u32,
    #[serde(default)]
    pub near_earth_objects: BTreeMap<String, Vec<NeoRecord>>,
}

impl NeoWsFeed {
    /// Flattens the per-date buckets in date order.
    pub fn into_objects(self) -> Vec<NearEarthObject> {
        self.near_earth_objects
            .into_values()
            .flatten()
            .map(NeoRecord::into_object)
            .collect()
    }
}

/// A single object as returned by `/feed` and `/neo/{id}`.
#[derive(Debug, Deserialize)]
pub struct NeoRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub nasa_jpl_url: Option<String>,
    #[serde(default)]
    pub absolute_magnitude_h: Option<f64>,
    #[serde(default)]
    estimated_diameter: Option<EstimatedDiameter>,
    #[serde(default)]
    pub is_potentially_hazardous_asteroid: bool,
    #[serde(default, deserialize_with = "null_as_empty")]
    close_approach_data: Vec<CloseApproachRecord>,
    #[serde(default)]
    orbital_data: Option<OrbitalRecord>,
}

#[derive(Debug, Deserialize)]
struct EstimatedDiameter {
    #[serde(default)]
    kilometers: Option<DiameterBounds>,
}

#[derive(Debug, Deserialize)]
struct DiameterBounds {
    #[serde(default)]
    estimated_diameter_min: Option<f64>,
    #[serde(default)]
    estimated_diameter_max: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CloseApproachRecord {
    close_approach_date: String,
    #[serde(default)]
    relative_velocity: Option<VelocityRecord>,
    miss_distance: MissDistanceRecord,
    #[serde(default)]
    orbiting_body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VelocityRecord {
    #[serde(default)]
    kilometers_per_hour: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MissDistanceRecord {
    #[serde(default)]
    kilometers: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrbitalRecord {
    #[serde(default)]
    orbit_id: Option<String>,
    #[serde(default)]
    eccentricity: Option<String>,
    #[serde(default)]
    semi_major_axis: Option<String>,
    #[serde(default)]
    inclination: Option<String>,
    #[serde(default)]
    orbital_period: Option<String>,
    #[serde(default)]
    minimum_orbit_intersection: Option<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl NeoRecord {
    pub fn into_object(self) -> NearEarthObject {
        let NeoRecord {
            id,
            name,
            nasa_jpl_url,
            absolute_magnitude_h,
            estimated_diameter,
            is_potentially_hazardous_asteroid,
            close_approach_data,
            orbital_data,
        } = self;

        let bounds = estimated_diameter.and_then(|diameter| diameter.kilometers);
        let estimated_diameter = match bounds {
            Some(bounds) => DiameterRange::new(
                bounds.estimated_diameter_min.unwrap_or(0.0),
                bounds.estimated_diameter_max.unwrap_or(0.0),
            ),
            None => DiameterRange::default(),
        };

        let close_approaches = close_approach_data
            .into_iter()
            .filter_map(|record| record.into_approach(&id))
            .collect();

        NearEarthObject {
            id: NeoId(id),
            name,
            nasa_jpl_url,
            absolute_magnitude: absolute_magnitude_h.filter(|value| value.is_finite()),
            is_potentially_hazardous: is_potentially_hazardous_asteroid,
            estimated_diameter,
            close_approaches,
            orbital_data: orbital_data.map(OrbitalRecord::into_elements),
        }
    }
}

impl CloseApproachRecord {
    /// Drops approaches whose date or miss distance cannot be trusted.
    fn into_approach(self, neo_id: &str) -> Option<CloseApproach> {
        let date = match NaiveDate::parse_from_str(self.close_approach_date.trim(), "%Y-%m-%d") {
            Ok(date) => date,
            Err(err) => {
                warn!(neo_id, raw = %self.close_approach_date, %err, "dropping approach with invalid date");
                return None;
            }
        };

        let raw_distance = self.miss_distance.kilometers.unwrap_or_default();
        let miss_distance_km = match parse_measure(&raw_distance) {
            Ok(distance) => distance,
            Err(err) => {
                warn!(neo_id, %date, %err, "dropping approach with invalid miss distance");
                return None;
            }
        };

        let relative_velocity_kph = self
            .relative_velocity
            .and_then(|velocity| velocity.kilometers_per_hour)
            .and_then(|raw| parse_measure(&raw).ok());

        Some(CloseApproach {
            date,
            miss_distance_km,
            relative_velocity_kph,
            orbiting_body: self.orbiting_body.unwrap_or_else(|| "Earth".to_string()),
        })
    }
}

impl OrbitalRecord {
    fn into_elements(self) -> OrbitalElements {
        let measure = |raw: Option<String>| raw.and_then(|value| parse_measure(&value).ok());
        OrbitalElements {
            orbit_id: self.orbit_id,
            eccentricity: measure(self.eccentricity),
            semi_major_axis_au: measure(self.semi_major_axis),
            inclination_deg: measure(self.inclination),
            orbital_period_days: measure(self.orbital_period),
            minimum_orbit_intersection_au: measure(self.minimum_orbit_intersection),
        }
    }
}
