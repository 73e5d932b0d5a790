use geo::{HaversineDistance, Point};

use crate::models::Coordinate;

/// Meters in one statute mile
pub const METERS_PER_MILE: f64 = 1609.34;

/// Convert meters to miles
#[inline]
pub fn meters_to_miles(meters: f64) -> f64 {
    meters / METERS_PER_MILE
}

/// Great-circle distance between two coordinates in miles
///
/// Uses the haversine formula, which ignores roads. Driving distance between
/// the same two points is never smaller than this value.
#[inline]
pub fn straight_line_miles(from: Coordinate, to: Coordinate) -> f64 {
    let from = Point::new(from.longitude, from.latitude);
    let to = Point::new(to.longitude, to.latitude);

    meters_to_miles(from.haversine_distance(&to))
}
