//! Road-snapping and routing via an OSRM-compatible HTTP service.
//!
//! The external collaborator behind the street-side geometry: a raw house
//! coordinate is mapped to the nearest point on the road network, and when
//! the snap moved the point far enough, a short trigger line perpendicular
//! to the house→road bearing is laid along the street.
//!
//! All failures surface as typed [`SnapError`] reasons; the core never
//! retries automatically (retry policy belongs to the caller).

mod osrm;
mod polyline;

pub use osrm::{OsrmClient, PUBLIC_OSRM_BASE_URL};
pub use polyline::decode_polyline;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

/// Half-length of the constructed trigger line in meters (full line 20 m).
pub const TRIGGER_LINE_HALF_LENGTH_M: f64 = 10.0;

/// Snap distances at or below this produce no trigger line: the house is
/// effectively on the road already.
pub const MIN_SNAP_FOR_LINE_M: f64 = 1.0;

/// Failure reasons for snap/route requests.
#[derive(Debug, Clone, Error)]
pub enum SnapError {
    /// The request exceeded the client timeout.
    #[error("request timed out")]
    Timeout,

    /// DNS/connection-level failure (typically no internet).
    #[error("connection failed: {0}")]
    Connection(String),

    /// HTTP-level failure (non-success status, transport error).
    #[error("http error: {0}")]
    Http(String),

    /// The service answered with a non-Ok application code.
    #[error("service error {code}: {message}")]
    Service {
        /// OSRM response code.
        code: String,
        /// Human-readable message from the service, if any.
        message: String,
    },

    /// The response body could not be interpreted.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The service answered Ok but produced no usable result.
    #[error("no result for the queried location")]
    NoResult,
}

/// Result of snapping a coordinate to the nearest road.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapResult {
    /// The queried latitude.
    pub original_lat: f64,
    /// The queried longitude.
    pub original_lng: f64,
    /// Nearest-road latitude.
    pub snapped_lat: f64,
    /// Nearest-road longitude.
    pub snapped_lng: f64,
    /// Distance from the query point to the road, in meters.
    pub distance_to_road_m: f64,
    /// Name of the matched road, when the service knows one.
    pub road_name: Option<String>,
    /// Trigger line endpoints along the road, present only when the snap
    /// distance exceeds [`MIN_SNAP_FOR_LINE_M`].
    pub trigger_line: Option<((f64, f64), (f64, f64))>,
}

/// Result of a road-network route query.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    /// Road distance in meters.
    pub distance_m: f64,
    /// Estimated travel duration in seconds.
    pub duration_s: f64,
    /// Route geometry as ordered `(lat, lng)` pairs.
    pub points: Vec<(f64, f64)>,
}

/// Road-snapping service contract.
///
/// Uses `Pin<Box<dyn Future>>` so engines can hold an `Arc<dyn RoadSnap>`
/// and tests can substitute a scripted implementation.
pub trait RoadSnap: Send + Sync {
    /// Find the nearest road point for a coordinate and derive the trigger
    /// line when applicable.
    fn snap_to_road(
        &self,
        lat: f64,
        lng: f64,
    ) -> Pin<Box<dyn Future<Output = Result<SnapResult, SnapError>> + Send + '_>>;

    /// Compute a road route between two coordinates.
    fn route(
        &self,
        from_lat: f64,
        from_lng: f64,
        to_lat: f64,
        to_lng: f64,
    ) -> Pin<Box<dyn Future<Output = Result<RouteResult, SnapError>> + Send + '_>>;
}
