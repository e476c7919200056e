use super::super::domain::NearEarthObject;
use super::RiskFactors;

pub(crate) const HAZARD_POINTS: u8 = 40;

pub(crate) const LARGE_DIAMETER_KM: f64 = 1.0;
pub(crate) const MEDIUM_DIAMETER_KM: f64 = 0.5;
pub(crate) const SMALL_DIAMETER_KM: f64 = 0.1;

pub(crate) const VERY_CLOSE_KM: f64 = 1_000_000.0;
pub(crate) const CLOSE_KM: f64 = 5_000_000.0;
pub(crate) const MODERATE_KM: f64 = 10_000_000.0;

pub(crate) fn score_factors(object: &NearEarthObject) -> RiskFactors {
    RiskFactors {
        hazard: hazard_points(object.is_potentially_hazardous),
        size: size_points(object.estimated_diameter.average_km()),
        proximity: proximity_points(minimum_miss_distance(object)),
    }
}

pub(crate) fn hazard_points(hazardous: bool) -> u8 {
    if hazardous {
        HAZARD_POINTS
    } else {
        0
    }
}

/// Non-finite averages land in the smallest band alongside missing diameters.
pub(crate) fn size_points(average_km: f64) -> u8 {
    if !average_km.is_finite() {
        return 5;
    }

    if average_km >= LARGE_DIAMETER_KM {
        30
    } else if average_km >= MEDIUM_DIAMETER_KM {
        20
    } else if average_km >= SMALL_DIAMETER_KM {
        10
    } else {
        5
    }
}

/// `None` means the object has no usable approach, which scores nothing rather
/// than the 5 points a distant approach earns.
pub(crate) fn proximity_points(minimum_km: Option<f64>) -> u8 {
    match minimum_km {
        None => 0,
        Some(distance) if distance < VERY_CLOSE_KM => 30,
        Some(distance) if distance < CLOSE_KM => 20,
        Some(distance) if distance < MODERATE_KM => 10,
        Some(_) => 5,
    }
}

fn minimum_miss_distance(object: &NearEarthObject) -> Option<f64> {
    object
        .close_approaches
        .iter()
        .filter(|approach| approach.has_valid_distance())
        .map(|approach| approach.miss_distance_km)
        .reduce(f64::min)
}
