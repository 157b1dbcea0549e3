//! Trigger lines: directional, road-aligned crossing detection.
//!
//! A trigger line is a short segment substituted for a circular tolerance
//! zone. Crossing is detected by the sign of the point-vs-line side test
//! flipping between two consecutive positions, which gives directional
//! semantics a circle cannot: approaching along the street fires, wandering
//! around the garden does not.
//!
//! Endpoints are derived on demand from center + rotation + length using a
//! local meters-per-degree approximation, valid at the tens-of-meters scale
//! these lines live at. Lines are only ever mutated by a single editor at a
//! time (drag-to-move, drag-to-rotate).

use crate::geo;

/// Default length of a newly created line in meters.
pub const DEFAULT_LINE_LENGTH_M: f64 = 30.0;

/// A single editable trigger line.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerLine {
    /// Identifier, unique within its owning set.
    pub id: u32,
    /// Line midpoint latitude in degrees.
    pub center_lat: f64,
    /// Line midpoint longitude in degrees.
    pub center_lng: f64,
    /// Rotation in degrees; 0 runs the line north-south.
    pub rotation_deg: f64,
    /// Full line length in meters.
    pub length_m: f64,
    /// Inactive lines are kept but never match a crossing.
    pub is_active: bool,
}

impl TriggerLine {
    /// Create an active line with the default length.
    pub fn new(id: u32, center_lat: f64, center_lng: f64) -> Self {
        Self {
            id,
            center_lat,
            center_lng,
            rotation_deg: 0.0,
            length_m: DEFAULT_LINE_LENGTH_M,
            is_active: true,
        }
    }

    /// Compute both endpoints as `((lat, lng), (lat, lng))`.
    ///
    /// Uses the local flat-earth meters-per-degree conversion; at line
    /// lengths of tens of meters the deviation from a geodesic projection
    /// is far below GPS accuracy.
    pub fn endpoints(&self) -> ((f64, f64), (f64, f64)) {
        let half = self.length_m / 2.0;
        let rot = self.rotation_deg.to_radians();

        let m_per_deg_lat = geo::METERS_PER_DEGREE_LAT;
        let m_per_deg_lng = geo::METERS_PER_DEGREE_LAT * self.center_lat.to_radians().cos();

        let dlat = half * rot.cos() / m_per_deg_lat;
        let dlng = half * rot.sin() / m_per_deg_lng;

        (
            (self.center_lat + dlat, self.center_lng + dlng),
            (self.center_lat - dlat, self.center_lng - dlng),
        )
    }

    /// Distance in meters from a point to the line center.
    pub fn distance_to_center_m(&self, lat: f64, lng: f64) -> f64 {
        geo::distance_m(lat, lng, self.center_lat, self.center_lng)
    }

    /// Shortest distance in meters from a point to the line segment.
    pub fn distance_to_line_m(&self, lat: f64, lng: f64) -> f64 {
        let ((a_lat, a_lng), (b_lat, b_lng)) = self.endpoints();
        geo::distance_to_segment_m(lat, lng, a_lat, a_lng, b_lat, b_lng)
    }

    /// Whether the movement from `prev` to `cur` crossed this line.
    ///
    /// Positions on opposite sides of the (infinite) line have side values
    /// of opposite sign; a sign flip between consecutive samples means the
    /// path crossed. Inactive lines never match. A sample exactly on the
    /// line (side == 0) does not count as a crossing by itself; the next
    /// sample resolves it.
    pub fn has_crossed(
        &self,
        prev_lat: f64,
        prev_lng: f64,
        cur_lat: f64,
        cur_lng: f64,
    ) -> bool {
        if !self.is_active {
            return false;
        }
        let ((a_lat, a_lng), (b_lat, b_lng)) = self.endpoints();

        let side = |lat: f64, lng: f64| {
            (b_lng - a_lng) * (lat - a_lat) - (b_lat - a_lat) * (lng - a_lng)
        };

        side(prev_lat, prev_lng) * side(cur_lat, cur_lng) < 0.0
    }

    /// Move the line center (drag-center edit).
    pub fn move_to(&mut self, lat: f64, lng: f64) {
        self.center_lat = lat;
        self.center_lng = lng;
    }

    /// Rotation implied by dragging an endpoint handle to `point`,
    /// in degrees from north.
    pub fn rotation_from_point(&self, point_lat: f64, point_lng: f64) -> f64 {
        let dlat = point_lat - self.center_lat;
        let dlng = point_lng - self.center_lng;
        dlng.atan2(dlat).to_degrees()
    }
}

/// An editable collection of up to [`TriggerLineSet::MAX_LINES`] trigger
/// lines guarding one target.
#[derive(Debug, Clone, Default)]
pub struct TriggerLineSet {
    lines: Vec<TriggerLine>,
    next_id: u32,
}

impl TriggerLineSet {
    /// Upper bound on lines per set.
    pub const MAX_LINES: usize = 5;

    /// Create an empty set.
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            next_id: 1,
        }
    }

    /// Add a line at the given center. Returns `None` when the set is full.
    ///
    /// Ids are never reused within a set, so removing and re-adding cannot
    /// produce duplicates.
    pub fn add_line(&mut self, lat: f64, lng: f64) -> Option<&TriggerLine> {
        if self.lines.len() >= Self::MAX_LINES {
            return None;
        }
        let line = TriggerLine::new(self.next_id, lat, lng);
        self.next_id += 1;
        self.lines.push(line);
        self.lines.last()
    }

    /// Remove a line by id. Returns whether a line was removed.
    pub fn remove_line(&mut self, id: u32) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.id != id);
        self.lines.len() != before
    }

    /// The first active line crossed by the movement `prev` -> `cur`, if any.
    pub fn first_crossed(
        &self,
        prev_lat: f64,
        prev_lng: f64,
        cur_lat: f64,
        cur_lng: f64,
    ) -> Option<&TriggerLine> {
        self.lines
            .iter()
            .find(|l| l.is_active && l.has_crossed(prev_lat, prev_lng, cur_lat, cur_lng))
    }

    /// Mutable access to a line by id, for editor operations.
    pub fn line_mut(&mut self, id: u32) -> Option<&mut TriggerLine> {
        self.lines.iter_mut().find(|l| l.id == id)
    }

    /// All lines, in insertion order.
    pub fn lines(&self) -> &[TriggerLine] {
        &self.lines
    }

    /// Number of lines in the set.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the set holds no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
