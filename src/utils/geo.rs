//! Great-circle distance and office geofences.

use serde::Serialize;
use thiserror::Error;

/// Mean Earth radius (IUGG), metres.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

#[derive(Debug, Error, PartialEq)]
pub enum GeoError {
    #[error("Invalid latitude {0}: must be a number between -90 and 90")]
    InvalidLatitude(f64),
    #[error("Invalid longitude {0}: must be a number between -180 and 180")]
    InvalidLongitude(f64),
    #[error("Latitude and longitude must be supplied together")]
    IncompleteCoordinates,
    #[error("Invalid office radius {0}: must be a positive number of metres")]
    InvalidRadius(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::InvalidLongitude(longitude));
        }
        Ok(Self { latitude, longitude })
    }

    /// Both or neither coordinate must be supplied.
    pub fn from_optional(
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Option<Self>, GeoError> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::new(lat, lon).map(Some),
            (Some(_), None) | (None, Some(_)) => Err(GeoError::IncompleteCoordinates),
            (None, None) => Ok(None),
        }
    }
}

/// Haversine distance in metres.
pub fn haversine_m(a: Coordinates, b: Coordinates) -> f64 {
    let (lat1, lat2) = (a.latitude.to_radians(), b.latitude.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geofence {
    pub centre: Coordinates,
    pub radius_m: f64,
}

impl Geofence {
    pub fn new(centre: Coordinates, radius_m: f64) -> Result<Self, GeoError> {
        if !radius_m.is_finite() || radius_m <= 0.0 {
            return Err(GeoError::InvalidRadius(radius_m));
        }
        Ok(Self { centre, radius_m })
    }

    pub fn distance_m(&self, point: Coordinates) -> f64 {
        haversine_m(self.centre, point)
    }

    /// Points exactly on the boundary are inside.
    pub fn contains(&self, point: Coordinates) -> bool {
        self.distance_m(point) <= self.radius_m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = haversine_m(c(0.0, 0.0), c(1.0, 0.0));
        assert!((d - 111_195.0).abs() < 1.0, "got {d}");
    }

    #[test]
    fn same_point_is_zero() {
        assert_eq!(haversine_m(c(23.78, 90.41), c(23.78, 90.41)), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = c(23.7806, 90.4074);
        let b = c(22.3569, 91.7832);
        assert!((haversine_m(a, b) - haversine_m(b, a)).abs() < 1e-6);
    }

    #[test]
    fn geofence_accepts_near_and_rejects_far() {
        let office = Geofence::new(c(23.7806, 90.4074), 100.0).unwrap();
        // ~0.0005 deg of latitude is ~55 m
        assert!(office.contains(c(23.7811, 90.4074)));
        // ~0.002 deg is ~222 m
        assert!(!office.contains(c(23.7826, 90.4074)));
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert_eq!(Coordinates::new(91.0, 0.0), Err(GeoError::InvalidLatitude(91.0)));
        assert_eq!(Coordinates::new(0.0, -181.0), Err(GeoError::InvalidLongitude(-181.0)));
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
        assert!(Coordinates::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn half_supplied_coordinates_are_rejected() {
        assert_eq!(
            Coordinates::from_optional(Some(10.0), None),
            Err(GeoError::IncompleteCoordinates)
        );
        assert!(Coordinates::from_optional(None, Some(10.0)).is_err());
        assert_eq!(Coordinates::from_optional(None, None), Ok(None));
    }

    #[test]
    fn radius_must_be_positive() {
        assert!(Geofence::new(c(0.0, 0.0), 0.0).is_err());
        assert!(Geofence::new(c(0.0, 0.0), -5.0).is_err());
    }
}
