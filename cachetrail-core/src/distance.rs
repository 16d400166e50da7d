//! Great-circle distances between WGS84 coordinates.
//!
//! Clustering and location scoring both work in a "degree-equivalent" unit:
//! the haversine distance in kilometres divided by the length of one degree
//! of latitude. All thresholds in the engine are expressed in that unit.

use geo::Coord;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometres per degree of latitude.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Return the haversine distance between two coordinates in kilometres.
///
/// Coordinates use `x = longitude` and `y = latitude` in degrees.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use cachetrail_core::distance::haversine_km;
///
/// let origin = Coord { x: 0.0, y: 0.0 };
/// let one_degree_north = Coord { x: 0.0, y: 1.0 };
/// let km = haversine_km(origin, one_degree_north);
/// assert!((km - 111.19).abs() < 0.01);
/// ```
#[must_use]
pub fn haversine_km(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let d_lat = (b.y - a.y).to_radians();
    let d_lng = (b.x - a.x).to_radians();
    let half_chord = (d_lat / 2.0).sin().powi(2)
        + a.y.to_radians().cos() * b.y.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let angle = 2.0 * half_chord.sqrt().atan2((1.0 - half_chord).sqrt());
    EARTH_RADIUS_KM * angle
}

/// Return the haversine distance expressed in degree-equivalents.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use cachetrail_core::distance::degree_distance;
///
/// let a = Coord { x: -88.2, y: 40.1 };
/// assert_eq!(degree_distance(a, a), 0.0);
/// ```
#[must_use]
pub fn degree_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    haversine_km(a, b) / KM_PER_DEGREE
}
