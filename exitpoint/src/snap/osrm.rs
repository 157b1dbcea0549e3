//! OSRM-backed implementation of the [`RoadSnap`] contract.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::Deserialize;

use crate::geo;

use super::polyline::decode_polyline;
use super::{
    RoadSnap, RouteResult, SnapError, SnapResult, MIN_SNAP_FOR_LINE_M,
    TRIGGER_LINE_HALF_LENGTH_M,
};

/// Public demo OSRM instance.
pub const PUBLIC_OSRM_BASE_URL: &str = "https://router.project-osrm.org";

/// Bounded request timeout; expiry is treated as failure, never retried here.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for an OSRM-compatible routing service.
pub struct OsrmClient {
    client: reqwest::Client,
    base_url: String,
}

impl OsrmClient {
    /// Create a client against the public OSRM instance.
    pub fn new() -> Result<Self, SnapError> {
        Self::with_base_url(PUBLIC_OSRM_BASE_URL)
    }

    /// Create a client against a custom service base URL.
    pub fn with_base_url(base_url: &str) -> Result<Self, SnapError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| SnapError::Http(format!("failed to create http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_text(&self, url: String) -> Result<String, SnapError> {
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            return Err(SnapError::Http(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        response.text().await.map_err(map_reqwest_error)
    }

    async fn snap(&self, lat: f64, lng: f64) -> Result<SnapResult, SnapError> {
        // OSRM takes longitude,latitude, reversed from the usual order.
        let url = format!("{}/nearest/v1/driving/{},{}", self.base_url, lng, lat);
        tracing::debug!(url = %url, "Snap-to-road request");

        let body = self.get_text(url).await?;
        let result = parse_nearest(&body, lat, lng)?;

        tracing::debug!(
            snapped_lat = result.snapped_lat,
            snapped_lng = result.snapped_lng,
            distance_m = result.distance_to_road_m,
            has_line = result.trigger_line.is_some(),
            "Snap-to-road result"
        );
        Ok(result)
    }

    async fn fetch_route(
        &self,
        from_lat: f64,
        from_lng: f64,
        to_lat: f64,
        to_lng: f64,
    ) -> Result<RouteResult, SnapError> {
        // No query parameters: the public server rejects them.
        let url = format!(
            "{}/route/v1/driving/{},{};{},{}",
            self.base_url, from_lng, from_lat, to_lng, to_lat
        );
        tracing::debug!(url = %url, "Route request");

        let body = self.get_text(url).await?;
        parse_route(&body)
    }
}

impl RoadSnap for OsrmClient {
    fn snap_to_road(
        &self,
        lat: f64,
        lng: f64,
    ) -> Pin<Box<dyn Future<Output = Result<SnapResult, SnapError>> + Send + '_>> {
        Box::pin(self.snap(lat, lng))
    }

    fn route(
        &self,
        from_lat: f64,
        from_lng: f64,
        to_lat: f64,
        to_lng: f64,
    ) -> Pin<Box<dyn Future<Output = Result<RouteResult, SnapError>> + Send + '_>> {
        Box::pin(self.fetch_route(from_lat, from_lng, to_lat, to_lng))
    }
}

fn map_reqwest_error(e: reqwest::Error) -> SnapError {
    if e.is_timeout() {
        SnapError::Timeout
    } else if e.is_connect() {
        SnapError::Connection(e.to_string())
    } else {
        SnapError::Http(e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct NearestResponse {
    code: String,
    message: Option<String>,
    waypoints: Option<Vec<Waypoint>>,
}

#[derive(Debug, Deserialize)]
struct Waypoint {
    location: [f64; 2],
    distance: f64,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: String,
    message: Option<String>,
    routes: Option<Vec<OsrmRoute>>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: String,
}

/// Parse an OSRM `nearest` response body for a query at `(lat, lng)`.
fn parse_nearest(body: &str, lat: f64, lng: f64) -> Result<SnapResult, SnapError> {
    let response: NearestResponse =
        serde_json::from_str(body).map_err(|e| SnapError::Malformed(e.to_string()))?;

    if response.code != "Ok" {
        return Err(SnapError::Service {
            code: response.code,
            message: response.message.unwrap_or_default(),
        });
    }

    let waypoint = response
        .waypoints
        .and_then(|w| w.into_iter().next())
        .ok_or(SnapError::NoResult)?;

    // OSRM locations are [longitude, latitude].
    let snapped_lng = waypoint.location[0];
    let snapped_lat = waypoint.location[1];
    let distance_to_road_m = waypoint.distance;

    Ok(SnapResult {
        original_lat: lat,
        original_lng: lng,
        snapped_lat,
        snapped_lng,
        distance_to_road_m,
        road_name: waypoint.name.filter(|n| !n.is_empty()),
        trigger_line: build_trigger_line(lat, lng, snapped_lat, snapped_lng, distance_to_road_m),
    })
}

/// Parse an OSRM `route` response body.
fn parse_route(body: &str) -> Result<RouteResult, SnapError> {
    let response: RouteResponse =
        serde_json::from_str(body).map_err(|e| SnapError::Malformed(e.to_string()))?;

    if response.code != "Ok" {
        return Err(SnapError::Service {
            code: response.code,
            message: response.message.unwrap_or_default(),
        });
    }

    let route = response
        .routes
        .and_then(|r| r.into_iter().next())
        .ok_or(SnapError::NoResult)?;

    Ok(RouteResult {
        distance_m: route.distance,
        duration_s: route.duration,
        points: decode_polyline(&route.geometry)?,
    })
}

/// Trigger line perpendicular to the house→road bearing, laid along the
/// road through the snap point (±10 m). None when the snap barely moved
/// the point: the house is already on the road and the line direction
/// would be noise.
fn build_trigger_line(
    house_lat: f64,
    house_lng: f64,
    snapped_lat: f64,
    snapped_lng: f64,
    distance_to_road_m: f64,
) -> Option<((f64, f64), (f64, f64))> {
    if distance_to_road_m <= MIN_SNAP_FOR_LINE_M {
        return None;
    }

    let bearing_to_road = geo::bearing_deg(house_lat, house_lng, snapped_lat, snapped_lng);
    let road_bearing = bearing_to_road + 90.0;

    let start = geo::destination_point(
        snapped_lat,
        snapped_lng,
        road_bearing,
        TRIGGER_LINE_HALF_LENGTH_M,
    );
    let end = geo::destination_point(
        snapped_lat,
        snapped_lng,
        road_bearing + 180.0,
        TRIGGER_LINE_HALF_LENGTH_M,
    );

    Some((start, end))
}
