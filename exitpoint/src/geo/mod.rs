//! Spherical geometry primitives
//!
//! Pure distance/bearing/projection functions on the WGS84 mean sphere.
//! All functions are stateless and side-effect free. Invalid numeric input
//! (NaN, infinities) propagates through the arithmetic; callers validate
//! coordinates at the session boundary, these functions never panic.

use std::f64::consts::PI;

/// Mean earth radius in meters (WGS84 sphere approximation).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude, used by local flat-earth conversions.
pub const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// Great-circle distance between two points in meters (haversine).
///
/// Accurate to well under 1% for distances below 10 km, which covers every
/// distance this crate evaluates (trigger radii and wake-up regions are
/// hundreds of meters at most).
pub fn distance_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lng2 - lng1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Initial bearing from the first point to the second, in degrees [0, 360).
///
/// 0 = North, 90 = East.
pub fn bearing_deg(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dlambda = (lng2 - lng1).to_radians();

    let y = dlambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlambda.cos();

    let bearing = y.atan2(x).to_degrees();
    (bearing + 360.0) % 360.0
}

/// Forward geodesic projection: the point `distance_m` meters from
/// `(lat, lng)` along `bearing_deg`.
///
/// Returns `(lat, lng)` in degrees.
pub fn destination_point(lat: f64, lng: f64, bearing_deg: f64, distance_m: f64) -> (f64, f64) {
    let phi = lat.to_radians();
    let lambda = lng.to_radians();
    let theta = bearing_deg.to_radians();
    let delta = distance_m / EARTH_RADIUS_M;

    let phi2 = (phi.sin() * delta.cos() + phi.cos() * delta.sin() * theta.cos()).asin();
    let lambda2 = lambda
        + (theta.sin() * delta.sin() * phi.cos()).atan2(delta.cos() - phi.sin() * phi2.sin());

    (phi2.to_degrees(), normalize_lng(lambda2.to_degrees()))
}

/// Shortest distance in meters from a point to a finite segment `a`..`b`.
///
/// The projection parameter is computed linearly in raw degree space, not
/// geodesically. Segments handled here (trigger lines) are tens of meters
/// long, where the error of this approximation is far below GPS accuracy;
/// it stays negligible for segments up to roughly 1 km. When `a == b` the
/// result degrades to the plain point distance.
pub fn distance_to_segment_m(
    p_lat: f64,
    p_lng: f64,
    a_lat: f64,
    a_lng: f64,
    b_lat: f64,
    b_lng: f64,
) -> f64 {
    let seg_len_sq =
        (b_lat - a_lat) * (b_lat - a_lat) + (b_lng - a_lng) * (b_lng - a_lng);

    if seg_len_sq == 0.0 {
        return distance_m(p_lat, p_lng, a_lat, a_lng);
    }

    // Clamped linear projection onto the segment.
    let t = (((p_lat - a_lat) * (b_lat - a_lat) + (p_lng - a_lng) * (b_lng - a_lng))
        / seg_len_sq)
        .clamp(0.0, 1.0);

    let nearest_lat = a_lat + t * (b_lat - a_lat);
    let nearest_lng = a_lng + t * (b_lng - a_lng);

    distance_m(p_lat, p_lng, nearest_lat, nearest_lng)
}

/// Normalize a longitude to [-180, 180).
fn normalize_lng(lng: f64) -> f64 {
    let wrapped = (lng + 180.0) % 360.0;
    if wrapped < 0.0 {
        wrapped + 180.0
    } else {
        wrapped - 180.0
    }
}
