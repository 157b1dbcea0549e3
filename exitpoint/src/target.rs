//! Target validation at the session boundary.
//!
//! A tracking session never starts with invalid coordinates or a radius out
//! of range; everything downstream can assume a well-formed target.

use thiserror::Error;

/// Largest accepted trigger radius in meters.
pub const MAX_TRIGGER_RADIUS_M: f64 = 10_000.0;

/// Errors rejected at the session boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TargetError {
    /// Latitude outside [-90, 90] or not finite.
    #[error("invalid latitude: {0}")]
    InvalidLatitude(f64),

    /// Longitude outside [-180, 180] or not finite.
    #[error("invalid longitude: {0}")]
    InvalidLongitude(f64),

    /// Radius not finite, non-positive or beyond [`MAX_TRIGGER_RADIUS_M`].
    #[error("invalid trigger radius: {0}m")]
    InvalidRadius(f64),
}

/// A validated tracking target: a fixed point plus a circular tolerance zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    latitude: f64,
    longitude: f64,
    trigger_radius_m: f64,
}

impl Target {
    /// Validate and construct a target.
    pub fn new(latitude: f64, longitude: f64, trigger_radius_m: f64) -> Result<Self, TargetError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(TargetError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(TargetError::InvalidLongitude(longitude));
        }
        if !trigger_radius_m.is_finite()
            || trigger_radius_m <= 0.0
            || trigger_radius_m > MAX_TRIGGER_RADIUS_M
        {
            return Err(TargetError::InvalidRadius(trigger_radius_m));
        }

        Ok(Self {
            latitude,
            longitude,
            trigger_radius_m,
        })
    }

    /// Target latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Target longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Radius of the circular trigger zone in meters.
    pub fn trigger_radius_m(&self) -> f64 {
        self.trigger_radius_m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_target() {
        let t = Target::new(47.0, 8.0, 20.0).unwrap();
        assert_eq!(t.latitude(), 47.0);
        assert_eq!(t.trigger_radius_m(), 20.0);
    }

    #[test]
    fn test_rejects_out_of_range_latitude() {
        assert!(matches!(
            Target::new(91.0, 8.0, 20.0),
            Err(TargetError::InvalidLatitude(_))
        ));
        assert!(matches!(
            Target::new(f64::NAN, 8.0, 20.0),
            Err(TargetError::InvalidLatitude(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_longitude() {
        assert!(matches!(
            Target::new(47.0, 181.0, 20.0),
            Err(TargetError::InvalidLongitude(_))
        ));
    }

    #[test]
    fn test_rejects_bad_radius() {
        assert!(matches!(
            Target::new(47.0, 8.0, 0.0),
            Err(TargetError::InvalidRadius(_))
        ));
        assert!(matches!(
            Target::new(47.0, 8.0, -5.0),
            Err(TargetError::InvalidRadius(_))
        ));
        assert!(matches!(
            Target::new(47.0, 8.0, 20_000.0),
            Err(TargetError::InvalidRadius(_))
        ));
    }
}
