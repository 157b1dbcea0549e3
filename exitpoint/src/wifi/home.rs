//! Home reference geometry for departure evaluation.

use crate::geo;
use crate::snap::SnapResult;

/// Snap distances at or below this are treated as "house is on the road":
/// the raw GPS fix stays the reference point and no road geometry is kept.
pub const IGNORE_SNAP_BELOW_M: f64 = 0.5;

/// Road-side geometry derived from a successful snap.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadGeometry {
    /// Nearest-road point latitude.
    pub snap_lat: f64,
    /// Nearest-road point longitude.
    pub snap_lng: f64,
    /// Distance from the house center to the snap point, in meters.
    pub house_to_snap_m: f64,
    /// Trigger line start endpoint `(lat, lng)`.
    pub line_start: (f64, f64),
    /// Trigger line end endpoint `(lat, lng)`.
    pub line_end: (f64, f64),
    /// Name of the snapped road, when known.
    pub road_name: Option<String>,
}

/// House center plus optional road-side geometry.
///
/// Without road geometry, departure decisions fall back to plain
/// distance-from-house thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct HomeGeometry {
    house_lat: f64,
    house_lng: f64,
    road: Option<RoadGeometry>,
}

impl HomeGeometry {
    /// Start from a bare house fix with no road information.
    pub fn new(house_lat: f64, house_lng: f64) -> Self {
        Self {
            house_lat,
            house_lng,
            road: None,
        }
    }

    /// Absorb a snap result.
    ///
    /// A snap that barely moved the point is discarded entirely; a snap
    /// without a trigger line keeps the snap point but supports only the
    /// distance-based tests.
    pub fn apply_snap(&mut self, snap: &SnapResult) {
        if snap.distance_to_road_m <= IGNORE_SNAP_BELOW_M {
            self.road = None;
            return;
        }

        self.road = snap.trigger_line.map(|(line_start, line_end)| RoadGeometry {
            snap_lat: snap.snapped_lat,
            snap_lng: snap.snapped_lng,
            house_to_snap_m: snap.distance_to_road_m,
            line_start,
            line_end,
            road_name: snap.road_name.clone(),
        });
    }

    /// House center latitude.
    pub fn house_lat(&self) -> f64 {
        self.house_lat
    }

    /// House center longitude.
    pub fn house_lng(&self) -> f64 {
        self.house_lng
    }

    /// Road geometry, when a usable snap was applied.
    pub fn road(&self) -> Option<&RoadGeometry> {
        self.road.as_ref()
    }

    /// Distance from a point to the house center, in meters.
    pub fn distance_from_house_m(&self, lat: f64, lng: f64) -> f64 {
        geo::distance_m(lat, lng, self.house_lat, self.house_lng)
    }

    /// Distance from a point to the snap point, in meters.
    pub fn distance_from_snap_m(&self, lat: f64, lng: f64) -> Option<f64> {
        self.road
            .as_ref()
            .map(|r| geo::distance_m(lat, lng, r.snap_lat, r.snap_lng))
    }

    /// Whether a point lies on the street side of the house.
    ///
    /// True when the point is further from the house than the road is,
    /// minus a noise margin: standing in the garden keeps this false.
    pub fn is_street_side(&self, lat: f64, lng: f64, margin_m: f64) -> bool {
        match &self.road {
            Some(r) => self.distance_from_house_m(lat, lng) > r.house_to_snap_m - margin_m,
            None => false,
        }
    }

    /// Distance from a point to the trigger line, in meters.
    pub fn distance_to_line_m(&self, lat: f64, lng: f64) -> Option<f64> {
        self.road.as_ref().map(|r| {
            geo::distance_to_segment_m(
                lat,
                lng,
                r.line_start.0,
                r.line_start.1,
                r.line_end.0,
                r.line_end.1,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUSE: (f64, f64) = (47.0, 8.0);

    fn snap_result(distance_to_road_m: f64, with_line: bool) -> SnapResult {
        let (snap_lat, snap_lng) =
            geo::destination_point(HOUSE.0, HOUSE.1, 0.0, distance_to_road_m);
        let line = with_line.then(|| {
            (
                geo::destination_point(snap_lat, snap_lng, 90.0, 10.0),
                geo::destination_point(snap_lat, snap_lng, 270.0, 10.0),
            )
        });
        SnapResult {
            original_lat: HOUSE.0,
            original_lng: HOUSE.1,
            snapped_lat: snap_lat,
            snapped_lng: snap_lng,
            distance_to_road_m,
            road_name: Some("Teststrasse".to_string()),
            trigger_line: line,
        }
    }

    #[test]
    fn test_tiny_snap_is_ignored() {
        let mut home = HomeGeometry::new(HOUSE.0, HOUSE.1);
        home.apply_snap(&snap_result(0.4, false));
        assert!(home.road().is_none());
    }

    #[test]
    fn test_snap_without_line_keeps_distance_mode() {
        let mut home = HomeGeometry::new(HOUSE.0, HOUSE.1);
        home.apply_snap(&snap_result(20.0, false));
        // No line means no road geometry at all; the plain-distance
        // evaluation path stays in effect.
        assert!(home.road().is_none());
    }

    #[test]
    fn test_street_side_test() {
        let mut home = HomeGeometry::new(HOUSE.0, HOUSE.1);
        home.apply_snap(&snap_result(25.0, true));

        // Standing between house and road, well short of the snap distance.
        let (garden_lat, garden_lng) = geo::destination_point(HOUSE.0, HOUSE.1, 0.0, 10.0);
        assert!(!home.is_street_side(garden_lat, garden_lng, 5.0));

        // Standing at the snap point itself: inside the margin, street side.
        let road = home.road().unwrap();
        assert!(home.is_street_side(road.snap_lat, road.snap_lng, 5.0));

        // Beyond the road.
        let (street_lat, street_lng) = geo::destination_point(HOUSE.0, HOUSE.1, 0.0, 40.0);
        assert!(home.is_street_side(street_lat, street_lng, 5.0));
    }

    #[test]
    fn test_distance_to_line_at_snap_point_is_zero() {
        let mut home = HomeGeometry::new(HOUSE.0, HOUSE.1);
        home.apply_snap(&snap_result(25.0, true));

        let road = home.road().unwrap();
        let d = home
            .distance_to_line_m(road.snap_lat, road.snap_lng)
            .unwrap();
        assert!(d < 0.5, "distance at snap point was {}m", d);
    }
}
