//! Geo location model

use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorCode};

fn point_type() -> String {
    "Point".to_string()
}

/// GeoJSON point with a human-readable address
///
/// `coordinates` is `[longitude, latitude]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "type", default = "point_type")]
    pub kind: String,
    pub coordinates: [f64; 2],
    #[serde(default)]
    pub address: String,
}

impl Location {
    pub fn new(longitude: f64, latitude: f64, address: impl Into<String>) -> Self {
        Self {
            kind: point_type(),
            coordinates: [longitude, latitude],
            address: address.into(),
        }
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude(), self.longitude())
    }

    /// Reject non-finite or out-of-range coordinates
    pub fn validate(&self) -> Result<(), AppError> {
        self.coordinates().validate()
    }
}

/// A bare latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(AppError::new(ErrorCode::InvalidCoordinates)
                .with_detail("latitude", self.latitude)
                .with_detail("longitude", self.longitude))
        }
    }

    /// Raw `"lat, lng"` text used when no address is known
    pub fn display_fallback(&self) -> String {
        format!("{}, {}", self.latitude, self.longitude)
    }
}
