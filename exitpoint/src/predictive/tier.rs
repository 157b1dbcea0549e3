//! Precision tiers for adaptive polling.
//!
//! A tier is a deterministic step function of the current distance to the
//! target only, never of time or history. Each tier carries a nominal poll
//! interval and a provider priority hint; the scheduler interpolates the
//! actual next-check delay inside the tier's clamp band.

use std::time::Duration;

use crate::position::FixPriority;

/// Polling precision tier, selected by distance to target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PrecisionTier {
    /// Beyond 500 m: one coarse fix every 5 minutes.
    LowPower,
    /// 200–500 m: one fix per minute.
    Balanced,
    /// 50–200 m: one fix every 10 s.
    HighAccuracy,
    /// Inside 50 m: full-rate sampling every 2 s to catch the crossing.
    MaximumPrecision,
}

impl PrecisionTier {
    /// Select the tier for a distance to target in meters.
    ///
    /// Boundary values belong to the coarser tier: `tier_for(50.0)` is
    /// `HighAccuracy`, not `MaximumPrecision`.
    pub fn tier_for(distance_to_target_m: f64) -> Self {
        if distance_to_target_m < 50.0 {
            PrecisionTier::MaximumPrecision
        } else if distance_to_target_m < 200.0 {
            PrecisionTier::HighAccuracy
        } else if distance_to_target_m < 500.0 {
            PrecisionTier::Balanced
        } else {
            PrecisionTier::LowPower
        }
    }

    /// Nominal poll interval; the upper bound of the tier's clamp band.
    pub fn nominal_interval(&self) -> Duration {
        match self {
            PrecisionTier::LowPower => Duration::from_secs(300),
            PrecisionTier::Balanced => Duration::from_secs(60),
            PrecisionTier::HighAccuracy => Duration::from_secs(10),
            PrecisionTier::MaximumPrecision => Duration::from_secs(2),
        }
    }

    /// Provider priority hint for fix requests in this tier.
    pub fn priority(&self) -> FixPriority {
        match self {
            PrecisionTier::LowPower => FixPriority::LowPower,
            PrecisionTier::Balanced => FixPriority::Balanced,
            PrecisionTier::HighAccuracy | PrecisionTier::MaximumPrecision => {
                FixPriority::HighAccuracy
            }
        }
    }

    /// Distance below which this tier becomes eligible, in meters.
    pub fn eligible_below_m(&self) -> f64 {
        match self {
            PrecisionTier::LowPower => f64::INFINITY,
            PrecisionTier::Balanced => 500.0,
            PrecisionTier::HighAccuracy => 200.0,
            PrecisionTier::MaximumPrecision => 50.0,
        }
    }
}

impl std::fmt::Display for PrecisionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrecisionTier::LowPower => write!(f, "low-power"),
            PrecisionTier::Balanced => write!(f, "balanced"),
            PrecisionTier::HighAccuracy => write!(f, "high-accuracy"),
            PrecisionTier::MaximumPrecision => write!(f, "maximum-precision"),
        }
    }
}
