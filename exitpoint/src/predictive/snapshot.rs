//! Immutable per-sample snapshots and end-of-session statistics.

use std::time::{Duration, Instant};

use super::speed::SpeedCategory;
use super::tier::PrecisionTier;

/// Read-only view of the tracking session after one processed sample.
///
/// Handed to the state-update callback; never mutated by the receiver.
#[derive(Debug, Clone)]
pub struct SchedulerSnapshot {
    /// Timestamp of the processed sample.
    pub timestamp: Instant,
    /// Sample latitude in degrees.
    pub latitude: f64,
    /// Sample longitude in degrees.
    pub longitude: f64,
    /// Reported fix accuracy in meters.
    pub accuracy_m: f64,
    /// Distance to the target center in meters.
    pub distance_to_target_m: f64,
    /// Distance until the trigger radius is reached; 0 inside the zone.
    pub distance_to_trigger_m: f64,
    /// Smoothed speed in m/s.
    pub speed_mps: f64,
    /// Smoothed speed in km/h.
    pub speed_kmh: f64,
    /// Movement category.
    pub speed_category: SpeedCategory,
    /// Estimated seconds until the trigger zone; infinite when not moving.
    pub eta_seconds: f64,
    /// Delay until the next scheduled fix request.
    pub next_check: Duration,
    /// Samples processed so far this session.
    pub check_count: u32,
    /// Whether the sample lies inside the trigger zone.
    pub in_trigger_zone: bool,
    /// Active precision tier.
    pub tier: PrecisionTier,
    /// Provider tag of the sample.
    pub provider: String,
}

/// Session summary delivered exactly once, with the trigger callback.
///
/// The fixed-interval projections compare the adaptive check count against
/// naive constant polling at 2 s / 10 s / 60 s over the same session
/// duration; they exist purely to report the battery benefit of the
/// adaptive approach.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatistics {
    /// Wall time from session start to the trigger.
    pub duration: Duration,
    /// Fix requests the adaptive scheduler actually spent.
    pub check_count: u32,
    /// Distance to target when the session started, in meters.
    pub start_distance_m: f64,
    /// Distance to the target center at trigger time, in meters.
    pub trigger_distance_m: f64,
    /// Fix accuracy at trigger time, in meters.
    pub trigger_accuracy_m: f64,
    /// Checks a constant 2 s poller would have spent.
    pub projected_checks_2s: u32,
    /// Checks a constant 10 s poller would have spent.
    pub projected_checks_10s: u32,
    /// Checks a constant 60 s poller would have spent.
    pub projected_checks_60s: u32,
    /// Fraction of checks saved vs. constant 2 s polling, in [0, 1].
    pub savings_vs_2s: f64,
    /// Fraction of checks saved vs. constant 10 s polling, in [0, 1].
    pub savings_vs_10s: f64,
}

impl SessionStatistics {
    pub(crate) fn compute(
        duration: Duration,
        check_count: u32,
        start_distance_m: f64,
        trigger_distance_m: f64,
        trigger_accuracy_m: f64,
    ) -> Self {
        let secs = duration.as_secs_f64();
        let projected = |interval: f64| (secs / interval) as u32;

        let projected_checks_2s = projected(2.0);
        let projected_checks_10s = projected(10.0);
        let projected_checks_60s = projected(60.0);

        let savings = |fixed: u32| {
            if fixed == 0 {
                0.0
            } else {
                (1.0 - check_count as f64 / fixed as f64).max(0.0)
            }
        };

        Self {
            duration,
            check_count,
            start_distance_m,
            trigger_distance_m,
            trigger_accuracy_m,
            projected_checks_2s,
            projected_checks_10s,
            projected_checks_60s,
            savings_vs_2s: savings(projected_checks_2s),
            savings_vs_10s: savings(projected_checks_10s),
        }
    }
}
