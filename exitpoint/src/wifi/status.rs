//! Tagged connectivity states.

use std::time::Instant;

/// State of the connectivity sleep controller.
///
/// Each variant carries exactly the data that is meaningful in that state,
/// so stale fields from a previous state cannot leak into decisions.
#[derive(Debug, Clone, PartialEq)]
pub enum WifiStatus {
    /// No Wi-Fi connection and nothing in flight.
    Disconnected,
    /// Connected to home Wi-Fi; the engine is asleep.
    Connected {
        /// Network name of the active Wi-Fi.
        ssid: String,
    },
    /// Wi-Fi was lost; waiting out the debounce window.
    Debouncing {
        /// When the loss was observed.
        since: Instant,
    },
    /// Debounce expired; a verification fix is in flight.
    Verifying,
    /// The loss was judged a router outage, not a departure.
    WifiOutage,
    /// Ambiguous distance; periodic movement checks are running.
    TrackingMovement {
        /// Movement checks completed so far.
        checks_done: u32,
    },
    /// Departure confirmed; the trigger callback has fired.
    Triggered {
        /// Distance from home at the moment of the trigger, in meters.
        final_distance_m: f64,
    },
}

impl WifiStatus {
    /// Short machine-friendly label, stable across payload changes.
    pub fn label(&self) -> &'static str {
        match self {
            WifiStatus::Disconnected => "disconnected",
            WifiStatus::Connected { .. } => "connected",
            WifiStatus::Debouncing { .. } => "debouncing",
            WifiStatus::Verifying => "verifying",
            WifiStatus::WifiOutage => "wifi-outage",
            WifiStatus::TrackingMovement { .. } => "tracking-movement",
            WifiStatus::Triggered { .. } => "triggered",
        }
    }
}

impl std::fmt::Display for WifiStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
