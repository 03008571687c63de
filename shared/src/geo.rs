//! Great-circle distance helpers

use crate::models::Coordinates;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance between two points, in meters
pub fn haversine_meters(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Latitude/longitude window containing every point within `radius_m`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub fn around(center: Coordinates, radius_m: f64) -> Self {
        let d_lat = (radius_m / EARTH_RADIUS_M).to_degrees();
        let min_lat = (center.latitude - d_lat).max(-90.0);
        let max_lat = (center.latitude + d_lat).min(90.0);

        // Near the poles the longitude window covers everything
        let cos_lat = center.latitude.to_radians().cos();
        let (min_lng, max_lng) = if cos_lat.abs() < 1e-6 || max_lat >= 90.0 || min_lat <= -90.0 {
            (-180.0, 180.0)
        } else {
            let d_lng = (radius_m / (EARTH_RADIUS_M * cos_lat)).to_degrees();
            if d_lng >= 180.0 {
                (-180.0, 180.0)
            } else {
                (center.longitude - d_lng, center.longitude + d_lng)
            }
        };

        Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        }
    }

    /// True when the window crosses the antimeridian
    pub fn wraps(&self) -> bool {
        self.min_lng < -180.0 || self.max_lng > 180.0
    }

    pub fn contains(&self, point: Coordinates) -> bool {
        if point.latitude < self.min_lat || point.latitude > self.max_lat {
            return false;
        }
        if !self.wraps() {
            return point.longitude >= self.min_lng && point.longitude <= self.max_lng;
        }
        let lng = point.longitude;
        (lng >= self.min_lng && lng <= self.max_lng)
            || (lng + 360.0 >= self.min_lng && lng + 360.0 <= self.max_lng)
            || (lng - 360.0 >= self.min_lng && lng - 360.0 <= self.max_lng)
    }
}
