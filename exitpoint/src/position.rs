//! Position samples and the external location-provider contract.
//!
//! The engines in this crate never hold an open location subscription: they
//! request exactly one fix at a time and re-request explicitly for the next
//! cycle, so provider-side polling cost stays proportional to the selected
//! precision tier.

use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

/// Provider priority hint attached to a single-fix request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixPriority {
    /// Coarse, battery-friendly fix (cell/Wi-Fi level accuracy is fine).
    LowPower,
    /// Balanced power/accuracy trade-off.
    Balanced,
    /// Full-accuracy GNSS fix.
    HighAccuracy,
}

impl std::fmt::Display for FixPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixPriority::LowPower => write!(f, "low-power"),
            FixPriority::Balanced => write!(f, "balanced"),
            FixPriority::HighAccuracy => write!(f, "high-accuracy"),
        }
    }
}

/// A single position fix delivered by the external location provider.
///
/// Immutable once produced; each engine consumes at most one sample per tick.
#[derive(Debug, Clone)]
pub struct PositionSample {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Reported horizontal accuracy in meters (1-sigma radius).
    pub accuracy_m: f64,
    /// Provider tag as reported by the platform ("gps", "fused", ...).
    pub provider: String,
    /// When the fix was produced.
    pub timestamp: Instant,
}

impl PositionSample {
    /// Create a sample stamped with the current time.
    pub fn new(latitude: f64, longitude: f64, accuracy_m: f64, provider: &str) -> Self {
        Self::with_timestamp(latitude, longitude, accuracy_m, provider, Instant::now())
    }

    /// Create a sample with an explicit timestamp (scripted inputs, tests).
    pub fn with_timestamp(
        latitude: f64,
        longitude: f64,
        accuracy_m: f64,
        provider: &str,
        timestamp: Instant,
    ) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m,
            provider: provider.to_string(),
            timestamp,
        }
    }
}

/// External location-fix provider contract.
///
/// `request_single_fix` resolves to `Some(sample)` when a fix arrives or
/// `None` when the provider gave up (its own timeout/retry policy). A `None`
/// is a no-op for the requesting cycle; the caller decides when to re-request.
///
/// Uses `Pin<Box<dyn Future>>` for trait-object support, so engines can hold
/// an `Arc<dyn LocationProvider>`.
pub trait LocationProvider: Send + Sync {
    /// Request exactly one fix with the given priority hint.
    fn request_single_fix(
        &self,
        priority: FixPriority,
    ) -> Pin<Box<dyn Future<Output = Option<PositionSample>> + Send + '_>>;
}

/// Connectivity transition reported by the platform.
///
/// Exactly two kinds exist; the ssid on `Available` is the only payload the
/// sleep controller needs (home geometry is re-acquired on ssid change).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityEvent {
    /// A Wi-Fi network became available.
    WifiAvailable {
        /// Network name of the newly active Wi-Fi.
        ssid: String,
    },
    /// The currently active Wi-Fi network was lost.
    WifiLost,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_with_explicit_timestamp() {
        let t = Instant::now();
        let s = PositionSample::with_timestamp(47.0, 8.0, 5.0, "gps", t);
        assert_eq!(s.timestamp, t);
        assert_eq!(s.provider, "gps");
    }

    #[test]
    fn test_fix_priority_display() {
        assert_eq!(format!("{}", FixPriority::LowPower), "low-power");
        assert_eq!(format!("{}", FixPriority::HighAccuracy), "high-accuracy");
    }
}
