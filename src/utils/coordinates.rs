use crate::error::{ProcessingError, Result};
use crate::utils::constants::COORDINATE_SCALE;

/// Largest magnitude the store's geo index accepts on either axis.
pub const COORDINATE_LIMIT: f64 = 179.999;
pub const MIN_COORDINATE: f64 = -COORDINATE_LIMIT;

/// Clamp a coordinate into the store's indexable domain.
///
/// # Examples
/// ```
/// use gsod_processor::utils::coordinates::clamp_coordinate;
///
/// assert_eq!(clamp_coordinate(180.0), 179.999);
/// assert_eq!(clamp_coordinate(-180.0), -179.999);
/// assert_eq!(clamp_coordinate(34.057), 34.057);
/// ```
pub fn clamp_coordinate(value: f64) -> f64 {
    value.clamp(MIN_COORDINATE, COORDINATE_LIMIT)
}

/// Convert a raw thousandths-of-a-degree value (e.g. `"-118238"`) to degrees.
pub fn scale_raw_coordinate(raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    let value = trimmed.parse::<f64>().map_err(|_| {
        ProcessingError::InvalidFormat(format!("Invalid coordinate value: '{}'", raw))
    })?;
    Ok(value * COORDINATE_SCALE)
}

/// Calculate the distance between two points using the Haversine formula
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.min(1.0).sqrt().asin();

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_coordinate() {
        assert_eq!(clamp_coordinate(180.0), 179.999);
        assert_eq!(clamp_coordinate(-180.0), -179.999);
        assert_eq!(clamp_coordinate(179.999), 179.999);
        assert_eq!(clamp_coordinate(0.0), 0.0);
    }

    #[test]
    fn test_scale_raw_coordinate() {
        assert!((scale_raw_coordinate("+34057").unwrap() - 34.057).abs() < 1e-9);
        assert!((scale_raw_coordinate(" -118238 ").unwrap() - -118.238).abs() < 1e-9);
        assert!(scale_raw_coordinate("N34").is_err());
    }

    #[test]
    fn test_haversine_distance() {
        // Los Angeles to San Francisco
        let distance = haversine_distance(33.938, -118.389, 37.620, -122.365);
        assert!((distance - 543.0).abs() < 10.0);
    }
}
