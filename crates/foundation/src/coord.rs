use serde::{Deserialize, Serialize};

use crate::math::{Dms, dms_to_decimal};

/// Geographic position in decimal degrees (WGS84).
///
/// Construction always validates: latitude in [-90, 90], longitude in
/// [-180, 180], both finite. Deserialization goes through the same check.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateError {
    NotFinite,
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
}

impl std::fmt::Display for CoordinateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordinateError::NotFinite => write!(f, "coordinate is not a finite number"),
            CoordinateError::LatitudeOutOfRange(v) => {
                write!(f, "latitude {v} outside [-90, 90]")
            }
            CoordinateError::LongitudeOutOfRange(v) => {
                write!(f, "longitude {v} outside [-180, 180]")
            }
        }
    }
}

impl std::error::Error for CoordinateError {}

impl Coordinate {
    /// Seoul City Hall.
    pub const SEOUL: Coordinate = Coordinate {
        latitude: 37.5665,
        longitude: 126.978,
    };

    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(CoordinateError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Build a coordinate from degrees/minutes/seconds components.
    pub fn from_dms(latitude: Dms, longitude: Dms) -> Result<Self, CoordinateError> {
        Self::new(dms_to_decimal(latitude), dms_to_decimal(longitude))
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CoordinateError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Coordinate::new(raw.latitude, raw.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::{Coordinate, CoordinateError};
    use crate::math::Dms;

    #[test]
    fn rejects_out_of_range_values() {
        assert_eq!(
            Coordinate::new(91.0, 0.0),
            Err(CoordinateError::LatitudeOutOfRange(91.0))
        );
        assert_eq!(
            Coordinate::new(0.0, -180.5),
            Err(CoordinateError::LongitudeOutOfRange(-180.5))
        );
        assert_eq!(Coordinate::new(f64::NAN, 0.0), Err(CoordinateError::NotFinite));
        assert!(Coordinate::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn deserializes_through_validation() {
        let ok: Coordinate =
            serde_json::from_str(r#"{"latitude": 37.5665, "longitude": 126.978}"#).unwrap();
        assert_eq!(ok.latitude(), 37.5665);

        let bad = serde_json::from_str::<Coordinate>(r#"{"latitude": 120.0, "longitude": 0.0}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn serializes_with_full_field_names() {
        let c = Coordinate::new(1.5, 2.5).unwrap();
        let json = serde_json::to_value(c).unwrap();
        assert_eq!(json, serde_json::json!({"latitude": 1.5, "longitude": 2.5}));
    }

    #[test]
    fn from_dms_converts_components() {
        let c =
            Coordinate::from_dms(Dms::new(37.0, 30.0, 0.0), Dms::new(127.0, 1.0, 48.0)).unwrap();
        assert!((c.latitude() - 37.5).abs() < 1e-12);
        assert!((c.longitude() - 127.03).abs() < 1e-12);
    }
}
