//! Per-sample trace records and the bounded UI trace ring.
//!
//! Every processed sample produces at least one [`TraceEntry`]; tier and
//! state transitions add extra annotated entries. The ring keeps the 200
//! most recent entries, newest first, so a UI can render it directly.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::predictive::{PrecisionTier, SpeedCategory};

/// Capacity of the trace ring.
pub const TRACE_RING_CAPACITY: usize = 200;

/// One trace record: the per-sample measurement plus an optional event text.
#[derive(Debug, Clone)]
pub struct TraceEntry {
    /// When the entry was produced.
    pub timestamp: Instant,
    /// Distance to target (or home, for connectivity entries) in meters.
    pub distance_m: f64,
    /// Reported fix accuracy in meters.
    pub accuracy_m: f64,
    /// Smoothed speed in km/h.
    pub speed_kmh: f64,
    /// Movement category at the time of the entry.
    pub category: SpeedCategory,
    /// Active precision tier.
    pub tier: PrecisionTier,
    /// Delay until the next scheduled check.
    pub next_check: Duration,
    /// Event annotation (tier change, trigger, state transition), if any.
    pub event: Option<String>,
}

impl TraceEntry {
    /// Entry for a plain measurement with no event annotation.
    pub fn measurement(
        timestamp: Instant,
        distance_m: f64,
        accuracy_m: f64,
        speed_kmh: f64,
        category: SpeedCategory,
        tier: PrecisionTier,
        next_check: Duration,
    ) -> Self {
        Self {
            timestamp,
            distance_m,
            accuracy_m,
            speed_kmh,
            category,
            tier,
            next_check,
            event: None,
        }
    }

    /// Attach an event annotation.
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = Some(event.into());
        self
    }
}

/// Bounded, newest-first trace buffer.
#[derive(Debug, Default)]
pub struct TraceRing {
    entries: VecDeque<TraceEntry>,
}

impl TraceRing {
    /// Create an empty ring.
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(TRACE_RING_CAPACITY),
        }
    }

    /// Push an entry; the oldest entry is dropped once the ring is full.
    pub fn push(&mut self, entry: TraceEntry) {
        if self.entries.len() == TRACE_RING_CAPACITY {
            self.entries.pop_back();
        }
        self.entries.push_front(entry);
    }

    /// Entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &TraceEntry> {
        self.entries.iter()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ring is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
