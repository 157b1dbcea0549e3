//! Adaptive predictive-polling scheduler.
//!
//! The control loop at the heart of the crate: each delivered position
//! sample updates the speed estimate, movement category and precision tier,
//! derives a safe delay until the next fix request, and decides whether the
//! one-time proximity trigger fires.
//!
//! # State Machine
//!
//! ```text
//! Idle --[start(target)]--> Tracking
//! Tracking --[in zone, accuracy <= gate]--> Triggered   (terminal per session)
//! Tracking --[stop()]--> Idle
//! Triggered --[stop()]--> Idle
//! ```
//!
//! Samples keep being processed in `Triggered` (the session still reports
//! state), but the trigger never fires twice within one session.
//!
//! # Battery model
//!
//! Outside the innermost tier the next-check delay is the ETA to the
//! trigger zone scaled by the movement category's safety factor, clamped
//! into `[0.8 × nominal, nominal]` of the current tier. Slow movers get
//! long delays even inside a fast tier; the tier ceiling guarantees the
//! responsiveness bound regardless of the ETA estimate.

use std::time::{Duration, Instant};

use crate::geo;
use crate::log::TraceEntry;
use crate::position::PositionSample;
use crate::target::Target;

use super::snapshot::{SchedulerSnapshot, SessionStatistics};
use super::speed::SpeedEstimator;
use super::tier::PrecisionTier;

/// Tunable constants of the per-sample algorithm.
///
/// The retreat relaxation is a heuristic without a formal noise model;
/// it is exposed here as a plain constant rather than derived.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum accuracy radius for which the trigger may fire (default 10 m).
    pub trigger_accuracy_m: f64,
    /// Relaxed max-precision interval while moving away (default 5 s).
    pub retreat_interval: Duration,
    /// Speed below which the ETA is treated as unknown (default 0.1 m/s).
    pub min_speed_for_eta_mps: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            trigger_accuracy_m: 10.0,
            retreat_interval: Duration::from_secs(5),
            min_speed_for_eta_mps: 0.1,
        }
    }
}

/// Lifecycle state of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No session active.
    Idle,
    /// Session running, trigger armed.
    Tracking,
    /// Trigger has fired; terminal until `stop()`.
    Triggered,
}

/// Everything produced by one processed sample.
#[derive(Debug)]
pub struct SchedulerTick {
    /// Immutable session view after this sample.
    pub snapshot: SchedulerSnapshot,
    /// Trace entries produced by this sample (tier changes, trigger, measurement).
    pub entries: Vec<TraceEntry>,
    /// Delay until the next fix request.
    pub next_check: Duration,
    /// Present exactly once per session: the trigger fired on this sample.
    pub trigger: Option<SessionStatistics>,
}

/// The adaptive predictive-polling engine.
///
/// Owns one tracking session at a time. All mutation happens inside
/// [`on_sample`](Self::on_sample); callers serialize event delivery.
#[derive(Debug)]
pub struct PredictiveScheduler {
    config: SchedulerConfig,
    state: SchedulerState,
    target: Option<Target>,

    check_count: u32,
    has_triggered: bool,
    estimator: SpeedEstimator,
    tier: PrecisionTier,
    last_sample: Option<PositionSample>,
    started_at: Option<Instant>,
    start_distance_m: Option<f64>,
}

impl Default for PredictiveScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl PredictiveScheduler {
    /// Create an idle scheduler.
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            state: SchedulerState::Idle,
            target: None,
            check_count: 0,
            has_triggered: false,
            estimator: SpeedEstimator::new(),
            tier: PrecisionTier::LowPower,
            last_sample: None,
            started_at: None,
            start_distance_m: None,
        }
    }

    /// Begin a session toward a validated target.
    ///
    /// A no-op while a session is already tracking; call [`stop`](Self::stop)
    /// first to restart. Starting from `Triggered` begins a fresh session.
    pub fn start(&mut self, target: Target) {
        if self.state == SchedulerState::Tracking {
            tracing::debug!("start ignored: session already tracking");
            return;
        }
        self.reset_session();
        self.target = Some(target);
        self.state = SchedulerState::Tracking;

        tracing::info!(
            target_lat = target.latitude(),
            target_lng = target.longitude(),
            radius_m = target.trigger_radius_m(),
            "Tracking session started"
        );
    }

    /// End the session. Idempotent; safe to call from any state.
    pub fn stop(&mut self) {
        if self.state == SchedulerState::Idle {
            return;
        }
        self.state = SchedulerState::Idle;
        self.target = None;
        self.reset_session();
        tracing::info!("Tracking session stopped");
    }

    fn reset_session(&mut self) {
        self.check_count = 0;
        self.has_triggered = false;
        self.estimator.reset();
        self.tier = PrecisionTier::LowPower;
        self.last_sample = None;
        self.started_at = None;
        self.start_distance_m = None;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Samples processed this session.
    pub fn check_count(&self) -> u32 {
        self.check_count
    }

    /// Whether the session trigger has fired.
    pub fn has_triggered(&self) -> bool {
        self.has_triggered
    }

    /// Precision tier after the most recent sample.
    pub fn current_tier(&self) -> PrecisionTier {
        self.tier
    }

    /// Process one position sample.
    ///
    /// Returns `None` while idle. Each processed sample increments the
    /// check count by exactly one and produces a snapshot, at least one
    /// trace entry, and the delay until the next fix request.
    pub fn on_sample(&mut self, sample: &PositionSample) -> Option<SchedulerTick> {
        if self.state == SchedulerState::Idle {
            return None;
        }
        let target = self.target?;

        self.check_count += 1;
        if self.started_at.is_none() {
            self.started_at = Some(sample.timestamp);
        }

        let distance_to_target_m = geo::distance_m(
            sample.latitude,
            sample.longitude,
            target.latitude(),
            target.longitude(),
        );
        let distance_to_trigger_m = (distance_to_target_m - target.trigger_radius_m()).max(0.0);

        if self.start_distance_m.is_none() {
            self.start_distance_m = Some(distance_to_target_m);
        }

        // Previous sample's distance to target, needed for the retreat rule
        // before the speed update consumes `last_sample`.
        let previous_distance_m = self.last_sample.as_ref().map(|last| {
            geo::distance_m(
                last.latitude,
                last.longitude,
                target.latitude(),
                target.longitude(),
            )
        });

        if let Some(last) = &self.last_sample {
            let elapsed = sample.timestamp.saturating_duration_since(last.timestamp);
            let moved_m = geo::distance_m(
                last.latitude,
                last.longitude,
                sample.latitude,
                sample.longitude,
            );
            self.estimator.observe(moved_m, elapsed);
        }

        let speed_mps = self.estimator.estimate_mps();
        let speed_kmh = self.estimator.estimate_kmh();
        let category = self.estimator.category();

        let mut entries = Vec::new();

        let new_tier = PrecisionTier::tier_for(distance_to_target_m);
        if new_tier != self.tier {
            tracing::info!(
                from = %self.tier,
                to = %new_tier,
                distance_m = distance_to_target_m,
                "Precision tier change"
            );
            entries.push(
                TraceEntry::measurement(
                    sample.timestamp,
                    distance_to_target_m,
                    sample.accuracy_m,
                    speed_kmh,
                    category,
                    new_tier,
                    Duration::ZERO,
                )
                .with_event(format!("tier: {}", new_tier)),
            );
        }
        self.tier = new_tier;

        let eta_seconds = if speed_mps > self.config.min_speed_for_eta_mps {
            distance_to_trigger_m / speed_mps
        } else {
            f64::INFINITY
        };

        let next_check = self.next_check(eta_seconds, distance_to_target_m, previous_distance_m);

        let in_trigger_zone = distance_to_trigger_m <= 0.0;
        let accuracy_ok = sample.accuracy_m <= self.config.trigger_accuracy_m;

        let trigger = if in_trigger_zone && accuracy_ok && !self.has_triggered {
            self.has_triggered = true;
            self.state = SchedulerState::Triggered;

            let duration = sample
                .timestamp
                .saturating_duration_since(self.started_at.unwrap_or(sample.timestamp));
            let stats = SessionStatistics::compute(
                duration,
                self.check_count,
                self.start_distance_m.unwrap_or(distance_to_target_m),
                distance_to_target_m,
                sample.accuracy_m,
            );

            tracing::info!(
                distance_m = distance_to_target_m,
                accuracy_m = sample.accuracy_m,
                checks = self.check_count,
                "Proximity trigger fired"
            );
            entries.push(
                TraceEntry::measurement(
                    sample.timestamp,
                    distance_to_target_m,
                    sample.accuracy_m,
                    speed_kmh,
                    category,
                    self.tier,
                    next_check,
                )
                .with_event(format!(
                    "TRIGGER: {:.0}m from target ({} ±{:.0}m)",
                    distance_to_target_m, sample.provider, sample.accuracy_m
                )),
            );

            Some(stats)
        } else {
            if in_trigger_zone && !accuracy_ok && !self.has_triggered {
                tracing::debug!(
                    accuracy_m = sample.accuracy_m,
                    gate_m = self.config.trigger_accuracy_m,
                    "In trigger zone but accuracy too low"
                );
                entries.push(
                    TraceEntry::measurement(
                        sample.timestamp,
                        distance_to_target_m,
                        sample.accuracy_m,
                        speed_kmh,
                        category,
                        self.tier,
                        next_check,
                    )
                    .with_event(format!(
                        "in zone, accuracy {:.0}m > {:.0}m",
                        sample.accuracy_m, self.config.trigger_accuracy_m
                    )),
                );
            }
            None
        };

        let snapshot = SchedulerSnapshot {
            timestamp: sample.timestamp,
            latitude: sample.latitude,
            longitude: sample.longitude,
            accuracy_m: sample.accuracy_m,
            distance_to_target_m,
            distance_to_trigger_m,
            speed_mps,
            speed_kmh,
            speed_category: category,
            eta_seconds,
            next_check,
            check_count: self.check_count,
            in_trigger_zone,
            tier: self.tier,
            provider: sample.provider.clone(),
        };

        entries.push(TraceEntry::measurement(
            sample.timestamp,
            distance_to_target_m,
            sample.accuracy_m,
            speed_kmh,
            category,
            self.tier,
            next_check,
        ));

        self.last_sample = Some(sample.clone());

        tracing::debug!(
            check = self.check_count,
            distance_m = distance_to_target_m,
            speed_kmh = speed_kmh,
            accuracy_m = sample.accuracy_m,
            next_check_s = next_check.as_secs_f64(),
            tier = %self.tier,
            "Sample processed"
        );

        Some(SchedulerTick {
            snapshot,
            entries,
            next_check,
            trigger,
        })
    }

    /// Delay until the next fix request.
    fn next_check(
        &self,
        eta_seconds: f64,
        distance_to_target_m: f64,
        previous_distance_m: Option<f64>,
    ) -> Duration {
        if self.tier == PrecisionTier::MaximumPrecision {
            // Close to the target, sample fast; a retreat reduces urgency.
            let moving_away =
                previous_distance_m.is_some_and(|prev| distance_to_target_m > prev);
            if moving_away {
                self.config.retreat_interval
            } else {
                self.tier.nominal_interval()
            }
        } else {
            let nominal_s = self.tier.nominal_interval().as_secs_f64();
            let scaled = eta_seconds * self.estimator.category().safety_factor();
            Duration::from_secs_f64(scaled.clamp(nominal_s * 0.8, nominal_s))
        }
    }
}
