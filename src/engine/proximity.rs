use geo::{Distance, Haversine, Point};

use crate::model::GeoPoint;

/// Great-circle distance in kilometres on a sphere of the mean Earth radius.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let a: Point<f64> = a.into();
    let b: Point<f64> = b.into();
    Haversine.distance(a, b) / 1000.0
}

/// No radius means unbounded. The boundary itself is inside.
pub fn within_radius(distance_km: f64, radius_km: Option<f64>) -> bool {
    radius_km.is_none_or(|r| distance_km <= r)
}
