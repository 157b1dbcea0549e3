//! Tunables for the connectivity sleep controller.

use std::time::Duration;

/// Thresholds and timings for the Wi-Fi departure state machine.
///
/// Defaults match field-tested values; `trigger_tolerance_m` is the one
/// knob expected to be adjusted per installation (wide streets need more).
#[derive(Debug, Clone)]
pub struct WifiConfig {
    /// Delay before a Wi-Fi loss is acted upon; absorbs brief flaps.
    pub debounce: Duration,
    /// Below this distance from home the loss is not a real departure.
    pub still_home_m: f64,
    /// At or above this distance from home the departure is certain.
    pub left_home_m: f64,
    /// Interval between movement checks while tracking.
    pub movement_interval: Duration,
    /// Consecutive away-moving checks that confirm a departure.
    pub movement_checks_needed: u32,
    /// Recheck delay while in the Wi-Fi-outage state.
    pub outage_recheck: Duration,
    /// Maximum distance to the trigger line that still counts as crossing.
    pub trigger_tolerance_m: f64,
    /// Slack subtracted from the house-to-road distance in the
    /// street-side test, absorbing GPS noise around the house.
    pub street_side_margin_m: f64,
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_secs(10),
            still_home_m: 30.0,
            left_home_m: 100.0,
            movement_interval: Duration::from_secs(15),
            movement_checks_needed: 3,
            outage_recheck: Duration::from_secs(30),
            trigger_tolerance_m: 15.0,
            street_side_margin_m: 5.0,
        }
    }
}
