//! Wi-Fi-presence-driven departure state machine.
//!
//! The controller is a pure state machine: every external occurrence is an
//! [`WifiEvent`], every side effect it wants is a [`WifiCommand`] returned
//! to the caller. Timers, fix requests and the snap HTTP call are executed
//! by the runtime driver, which posts their outcomes back as events; state
//! mutation stays strictly serialized in arrival order.

use std::time::{Duration, Instant};

use crate::log::TraceEntry;
use crate::position::PositionSample;
use crate::predictive::{PrecisionTier, SpeedCategory};
use crate::snap::{SnapError, SnapResult};

use super::config::WifiConfig;
use super::home::HomeGeometry;
use super::status::WifiStatus;

/// Why a single fix was requested; echoed back with the resulting sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixPurpose {
    /// Establish the house center after (re)connecting to Wi-Fi.
    HomeAcquisition,
    /// Decide whether a debounced Wi-Fi loss is a real departure.
    Verification,
    /// Periodic fix while tracking ambiguous movement.
    MovementCheck,
}

/// Timer kinds owned by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WifiTimer {
    /// Debounce window after a Wi-Fi loss.
    Debounce,
    /// Recheck delay while in the outage state.
    OutageRecheck,
    /// Interval between movement checks.
    MovementCheck,
}

/// External occurrence fed into the state machine.
#[derive(Debug, Clone)]
pub enum WifiEvent {
    /// The OS reports a Wi-Fi network became available.
    WifiAvailable {
        /// Network name of the newly active Wi-Fi.
        ssid: String,
    },
    /// The OS reports the active Wi-Fi network was lost.
    WifiLost,
    /// A previously scheduled timer fired.
    Timer(WifiTimer),
    /// A requested fix arrived.
    Fix(FixPurpose, PositionSample),
    /// A requested fix could not be produced.
    FixFailed(FixPurpose),
    /// The road-snap request resolved.
    SnapResolved(Result<SnapResult, SnapError>),
    /// Runtime adjustment of the trigger-line tolerance.
    SetTriggerTolerance(f64),
}

impl From<WifiTimer> for WifiEvent {
    fn from(timer: WifiTimer) -> Self {
        WifiEvent::Timer(timer)
    }
}

/// Side effect requested by the state machine.
#[derive(Debug, Clone)]
pub enum WifiCommand {
    /// Request one high-accuracy fix for the given purpose.
    RequestFix(FixPurpose),
    /// Arm a timer; re-arming a pending timer of the same kind replaces it.
    Schedule(WifiTimer, Duration),
    /// Cancel every pending timer.
    CancelTimers,
    /// Issue the road-snap request for the house center.
    Snap {
        /// House center latitude.
        lat: f64,
        /// House center longitude.
        lng: f64,
    },
    /// Publish the new status to observers.
    Publish(WifiStatus),
    /// Fire the departure trigger.
    Trigger {
        /// Distance from home at the moment of the trigger, in meters.
        final_distance_m: f64,
    },
    /// Append a trace entry to the shared ring.
    Trace(TraceEntry),
}

/// The connectivity sleep controller.
pub struct WifiMonitor {
    config: WifiConfig,
    status: WifiStatus,
    home: Option<HomeGeometry>,
    ssid: Option<String>,
    wifi_connected: bool,
    has_triggered: bool,
    away_streak: u32,
    last_movement_fix: Option<PositionSample>,
    pending_home_publish: bool,
    monitoring: bool,
}

impl WifiMonitor {
    /// Create a stopped monitor.
    pub fn new(config: WifiConfig) -> Self {
        Self {
            config,
            status: WifiStatus::Disconnected,
            home: None,
            ssid: None,
            wifi_connected: false,
            has_triggered: false,
            away_streak: 0,
            last_movement_fix: None,
            pending_home_publish: false,
            monitoring: false,
        }
    }

    /// Begin monitoring from a clean slate.
    pub fn start(&mut self) -> Vec<WifiCommand> {
        self.reset();
        self.monitoring = true;
        tracing::info!("Wi-Fi departure monitoring started");
        vec![WifiCommand::Publish(WifiStatus::Disconnected)]
    }

    /// Stop monitoring; safe to call repeatedly.
    pub fn stop(&mut self) -> Vec<WifiCommand> {
        if !self.monitoring {
            return Vec::new();
        }
        self.monitoring = false;
        self.reset();
        tracing::info!("Wi-Fi departure monitoring stopped");
        vec![WifiCommand::CancelTimers]
    }

    /// Adjust the trigger-line tolerance at runtime.
    pub fn set_trigger_tolerance(&mut self, tolerance_m: f64) {
        self.config.trigger_tolerance_m = tolerance_m.max(0.0);
    }

    /// Current status.
    pub fn status(&self) -> &WifiStatus {
        &self.status
    }

    /// Home geometry, once acquired.
    pub fn home(&self) -> Option<&HomeGeometry> {
        self.home.as_ref()
    }

    /// Feed one event; returns the side effects to execute.
    pub fn handle(&mut self, event: WifiEvent, now: Instant) -> Vec<WifiCommand> {
        if !self.monitoring {
            return Vec::new();
        }

        match event {
            WifiEvent::WifiAvailable { ssid } => self.on_wifi_available(ssid),
            WifiEvent::WifiLost => self.on_wifi_lost(now),
            WifiEvent::Timer(timer) => self.on_timer(timer),
            WifiEvent::Fix(purpose, sample) => self.on_fix(purpose, sample, now),
            WifiEvent::FixFailed(purpose) => self.on_fix_failed(purpose),
            WifiEvent::SnapResolved(result) => self.on_snap_resolved(result, now),
            WifiEvent::SetTriggerTolerance(tolerance_m) => {
                self.set_trigger_tolerance(tolerance_m);
                Vec::new()
            }
        }
    }

    fn reset(&mut self) {
        self.status = WifiStatus::Disconnected;
        self.home = None;
        self.ssid = None;
        self.wifi_connected = false;
        self.has_triggered = false;
        self.away_streak = 0;
        self.last_movement_fix = None;
        self.pending_home_publish = false;
    }

    fn on_wifi_available(&mut self, ssid: String) -> Vec<WifiCommand> {
        self.wifi_connected = true;
        self.has_triggered = false;
        self.away_streak = 0;
        self.last_movement_fix = None;

        let ssid_changed = self.ssid.as_deref() != Some(ssid.as_str());
        self.ssid = Some(ssid.clone());
        self.status = WifiStatus::Connected { ssid: ssid.clone() };

        let mut cmds = vec![WifiCommand::CancelTimers];
        if ssid_changed || self.home.is_none() {
            // Home geometry is unknown or belongs to another network; the
            // connected status is published once the snap attempt resolves.
            tracing::info!(ssid = %ssid, "Wi-Fi available, acquiring home location");
            self.pending_home_publish = true;
            cmds.push(WifiCommand::RequestFix(FixPurpose::HomeAcquisition));
        } else {
            tracing::info!(ssid = %ssid, "Wi-Fi available, back to sleep");
            cmds.push(WifiCommand::Publish(self.status.clone()));
        }
        cmds
    }

    fn on_wifi_lost(&mut self, now: Instant) -> Vec<WifiCommand> {
        self.wifi_connected = false;

        // A loss only matters while asleep; every other state is already
        // working through a loss.
        if !matches!(self.status, WifiStatus::Connected { .. }) {
            tracing::debug!(status = %self.status, "Wi-Fi loss ignored");
            return Vec::new();
        }

        tracing::info!(
            debounce_secs = self.config.debounce.as_secs(),
            "Wi-Fi lost, debouncing"
        );
        self.status = WifiStatus::Debouncing { since: now };
        vec![
            WifiCommand::Schedule(WifiTimer::Debounce, self.config.debounce),
            WifiCommand::Publish(self.status.clone()),
        ]
    }

    fn on_timer(&mut self, timer: WifiTimer) -> Vec<WifiCommand> {
        match timer {
            WifiTimer::Debounce => {
                if self.wifi_connected || !matches!(self.status, WifiStatus::Debouncing { .. }) {
                    return Vec::new();
                }
                tracing::info!("Debounce expired, verifying departure");
                self.status = WifiStatus::Verifying;
                vec![
                    WifiCommand::Publish(self.status.clone()),
                    WifiCommand::RequestFix(FixPurpose::Verification),
                ]
            }
            WifiTimer::OutageRecheck => {
                if !matches!(self.status, WifiStatus::WifiOutage) {
                    return Vec::new();
                }
                if self.wifi_connected {
                    // The available callback was missed; recover silently.
                    let ssid = self.ssid.clone().unwrap_or_default();
                    self.status = WifiStatus::Connected { ssid };
                    return vec![WifiCommand::Publish(self.status.clone())];
                }
                tracing::info!("Outage recheck, re-verifying");
                self.status = WifiStatus::Verifying;
                vec![
                    WifiCommand::Publish(self.status.clone()),
                    WifiCommand::RequestFix(FixPurpose::Verification),
                ]
            }
            WifiTimer::MovementCheck => {
                if self.wifi_connected
                    || !matches!(self.status, WifiStatus::TrackingMovement { .. })
                {
                    return Vec::new();
                }
                vec![WifiCommand::RequestFix(FixPurpose::MovementCheck)]
            }
        }
    }

    fn on_fix(
        &mut self,
        purpose: FixPurpose,
        sample: PositionSample,
        now: Instant,
    ) -> Vec<WifiCommand> {
        match purpose {
            FixPurpose::HomeAcquisition => {
                self.home = Some(HomeGeometry::new(sample.latitude, sample.longitude));
                tracing::info!(
                    lat = sample.latitude,
                    lng = sample.longitude,
                    accuracy_m = sample.accuracy_m,
                    "House center acquired, requesting road snap"
                );
                vec![WifiCommand::Snap {
                    lat: sample.latitude,
                    lng: sample.longitude,
                }]
            }
            FixPurpose::Verification => {
                if self.wifi_connected || !matches!(self.status, WifiStatus::Verifying) {
                    tracing::debug!("Stale verification fix ignored");
                    return Vec::new();
                }
                self.evaluate_verification(sample, now)
            }
            FixPurpose::MovementCheck => {
                if self.wifi_connected {
                    tracing::debug!("Stale movement fix ignored");
                    return Vec::new();
                }
                let WifiStatus::TrackingMovement { checks_done } = self.status else {
                    return Vec::new();
                };
                self.evaluate_movement(sample, checks_done + 1, now)
            }
        }
    }

    fn on_fix_failed(&mut self, purpose: FixPurpose) -> Vec<WifiCommand> {
        match purpose {
            FixPurpose::HomeAcquisition => {
                tracing::warn!("Home acquisition fix failed, no reference point");
                if self.pending_home_publish && self.wifi_connected {
                    self.pending_home_publish = false;
                    return vec![WifiCommand::Publish(self.status.clone())];
                }
                Vec::new()
            }
            FixPurpose::Verification => {
                if self.wifi_connected || !matches!(self.status, WifiStatus::Verifying) {
                    return Vec::new();
                }
                tracing::warn!("Verification fix failed, treating as outage");
                self.enter_outage()
            }
            FixPurpose::MovementCheck => {
                if self.wifi_connected
                    || !matches!(self.status, WifiStatus::TrackingMovement { .. })
                {
                    return Vec::new();
                }
                tracing::warn!("Movement fix failed, rescheduling");
                vec![WifiCommand::Schedule(
                    WifiTimer::MovementCheck,
                    self.config.movement_interval,
                )]
            }
        }
    }

    fn on_snap_resolved(
        &mut self,
        result: Result<SnapResult, SnapError>,
        now: Instant,
    ) -> Vec<WifiCommand> {
        let mut cmds = Vec::new();

        match result {
            Ok(snap) if self.home.is_some() => {
                if let Some(home) = self.home.as_mut() {
                    home.apply_snap(&snap);
                }
                tracing::info!(
                    distance_to_road_m = snap.distance_to_road_m,
                    road = snap.road_name.as_deref().unwrap_or("?"),
                    "Road snap resolved"
                );
                cmds.push(WifiCommand::Trace(self.wifi_trace(
                    now,
                    snap.distance_to_road_m,
                    0.0,
                    format!(
                        "road snap: {:.1}m to {}",
                        snap.distance_to_road_m,
                        snap.road_name.as_deref().unwrap_or("road")
                    ),
                )));
            }
            Ok(_) => {}
            Err(e) => {
                // Fall back to plain distance from the house fix.
                tracing::warn!(error = %e, "Road snap failed, distance-only mode");
            }
        }

        if self.pending_home_publish {
            self.pending_home_publish = false;
            if self.wifi_connected {
                cmds.push(WifiCommand::Publish(self.status.clone()));
            }
        }
        cmds
    }

    fn evaluate_verification(&mut self, sample: PositionSample, now: Instant) -> Vec<WifiCommand> {
        let Some(home) = self.home.clone() else {
            tracing::warn!("Verification without home reference, treating as outage");
            return self.enter_outage();
        };

        let d_home = home.distance_from_house_m(sample.latitude, sample.longitude);
        tracing::info!(
            distance_m = d_home,
            accuracy_m = sample.accuracy_m,
            street_side_mode = home.road().is_some(),
            "Verification fix evaluated"
        );

        if d_home >= self.config.left_home_m {
            return self.fire_trigger(d_home, &sample, now);
        }

        if home.road().is_some() {
            let street_side = home.is_street_side(
                sample.latitude,
                sample.longitude,
                self.config.street_side_margin_m,
            );
            if !street_side {
                return self.enter_outage();
            }
            let d_line = home
                .distance_to_line_m(sample.latitude, sample.longitude)
                .unwrap_or(f64::INFINITY);
            if d_line <= self.config.trigger_tolerance_m {
                return self.fire_trigger(d_home, &sample, now);
            }
            return self.enter_tracking(sample, now);
        }

        if d_home < self.config.still_home_m {
            return self.enter_outage();
        }
        self.enter_tracking(sample, now)
    }

    fn evaluate_movement(
        &mut self,
        sample: PositionSample,
        checks_done: u32,
        now: Instant,
    ) -> Vec<WifiCommand> {
        let Some(home) = self.home.clone() else {
            return self.enter_outage();
        };

        let d_home = home.distance_from_house_m(sample.latitude, sample.longitude);

        // Speed over the check interval, for the trace only; departure
        // decisions use distances, not speed.
        let (moving_away, speed_kmh) = match &self.last_movement_fix {
            Some(prev) => {
                let moved_m = crate::geo::distance_m(
                    prev.latitude,
                    prev.longitude,
                    sample.latitude,
                    sample.longitude,
                );
                let elapsed = sample
                    .timestamp
                    .saturating_duration_since(prev.timestamp)
                    .as_secs_f64();
                let speed = if elapsed > 0.0 {
                    moved_m / elapsed * 3.6
                } else {
                    0.0
                };
                (
                    d_home > home.distance_from_house_m(prev.latitude, prev.longitude),
                    speed,
                )
            }
            None => (false, 0.0),
        };
        self.away_streak = if moving_away { self.away_streak + 1 } else { 0 };

        tracing::info!(
            distance_m = d_home,
            checks_done,
            away_streak = self.away_streak,
            "Movement check"
        );

        if d_home < self.config.still_home_m {
            return self.enter_outage();
        }

        if d_home >= self.config.left_home_m {
            return self.fire_trigger(d_home, &sample, now);
        }

        if let Some(d_snap) = home.distance_from_snap_m(sample.latitude, sample.longitude) {
            if d_snap >= self.config.left_home_m {
                return self.fire_trigger(d_home, &sample, now);
            }
        }

        let consistent_departure = self.away_streak >= self.config.movement_checks_needed;
        let street_side_ok = home.road().is_none()
            || home.is_street_side(
                sample.latitude,
                sample.longitude,
                self.config.street_side_margin_m,
            );
        if consistent_departure && street_side_ok {
            return self.fire_trigger(d_home, &sample, now);
        }

        self.status = WifiStatus::TrackingMovement { checks_done };
        self.last_movement_fix = Some(sample.clone());

        let entry = TraceEntry::measurement(
            now,
            d_home,
            sample.accuracy_m,
            speed_kmh,
            SpeedCategory::for_kmh(speed_kmh),
            PrecisionTier::HighAccuracy,
            self.config.movement_interval,
        )
        .with_event(format!(
            "movement check {}: {:.0}m from home",
            checks_done, d_home
        ));

        vec![
            WifiCommand::Schedule(WifiTimer::MovementCheck, self.config.movement_interval),
            WifiCommand::Publish(self.status.clone()),
            WifiCommand::Trace(entry),
        ]
    }

    fn enter_tracking(&mut self, sample: PositionSample, now: Instant) -> Vec<WifiCommand> {
        let d_home = self
            .home
            .as_ref()
            .map(|h| h.distance_from_house_m(sample.latitude, sample.longitude))
            .unwrap_or(0.0);

        self.status = WifiStatus::TrackingMovement { checks_done: 0 };
        self.away_streak = 0;
        self.last_movement_fix = Some(sample.clone());

        vec![
            WifiCommand::Schedule(WifiTimer::MovementCheck, self.config.movement_interval),
            WifiCommand::Publish(self.status.clone()),
            WifiCommand::Trace(self.wifi_trace(
                now,
                d_home,
                sample.accuracy_m,
                format!("tracking movement from {:.0}m", d_home),
            )),
        ]
    }

    fn enter_outage(&mut self) -> Vec<WifiCommand> {
        self.status = WifiStatus::WifiOutage;
        self.away_streak = 0;
        self.last_movement_fix = None;
        vec![
            WifiCommand::Schedule(WifiTimer::OutageRecheck, self.config.outage_recheck),
            WifiCommand::Publish(self.status.clone()),
        ]
    }

    fn fire_trigger(
        &mut self,
        final_distance_m: f64,
        sample: &PositionSample,
        now: Instant,
    ) -> Vec<WifiCommand> {
        if self.has_triggered {
            return Vec::new();
        }
        self.has_triggered = true;
        self.status = WifiStatus::Triggered { final_distance_m };

        tracing::info!(distance_m = final_distance_m, "Departure trigger fired");
        vec![
            WifiCommand::CancelTimers,
            WifiCommand::Trigger { final_distance_m },
            WifiCommand::Publish(self.status.clone()),
            WifiCommand::Trace(self.wifi_trace(
                now,
                final_distance_m,
                sample.accuracy_m,
                format!("WIFI TRIGGER: {:.0}m from home", final_distance_m),
            )),
        ]
    }

    fn wifi_trace(
        &self,
        now: Instant,
        distance_m: f64,
        accuracy_m: f64,
        event: String,
    ) -> TraceEntry {
        TraceEntry::measurement(
            now,
            distance_m,
            accuracy_m,
            0.0,
            SpeedCategory::Still,
            PrecisionTier::HighAccuracy,
            Duration::ZERO,
        )
        .with_event(event)
    }
}
