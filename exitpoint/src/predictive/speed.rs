//! Movement classification and smoothed speed estimation.
//!
//! A sliding window over the last five instantaneous speeds smooths
//! single-fix GPS jitter without excessive lag. Implausible jumps are
//! rejected before entering the window.

use std::collections::VecDeque;
use std::time::Duration;

/// Window capacity for speed smoothing.
const MAX_SPEED_HISTORY: usize = 5;

/// Instantaneous speeds at or above this are GPS jump artifacts (216 km/h).
const MAX_PLAUSIBLE_SPEED_MPS: f64 = 60.0;

/// Minimum elapsed time between samples for a usable speed estimate.
const MIN_ELAPSED: Duration = Duration::from_secs(1);

/// Default estimate before any movement has been observed: pedestrian pace.
pub const DEFAULT_SPEED_MPS: f64 = 1.4;

/// Movement class derived from smoothed speed.
///
/// Each category carries a safety factor used to shrink the predicted
/// next-check interval: faster movement means a smaller factor, so the
/// scheduler re-samples well before the naive ETA would expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedCategory {
    /// Essentially stationary (< 2 km/h).
    Still,
    /// Walking pace (2–7 km/h).
    Walking,
    /// Running pace (7–12 km/h).
    Running,
    /// Cycling pace (12–28 km/h).
    Cycling,
    /// Vehicle speed (≥ 28 km/h).
    Driving,
}

impl SpeedCategory {
    /// Classify a smoothed speed in km/h.
    pub fn for_kmh(speed_kmh: f64) -> Self {
        if speed_kmh < 2.0 {
            SpeedCategory::Still
        } else if speed_kmh < 7.0 {
            SpeedCategory::Walking
        } else if speed_kmh < 12.0 {
            SpeedCategory::Running
        } else if speed_kmh < 28.0 {
            SpeedCategory::Cycling
        } else {
            SpeedCategory::Driving
        }
    }

    /// Fraction of the naive ETA to wait before the next check.
    pub fn safety_factor(&self) -> f64 {
        match self {
            SpeedCategory::Still => 0.95,
            SpeedCategory::Walking => 0.70,
            SpeedCategory::Running => 0.55,
            SpeedCategory::Cycling => 0.45,
            SpeedCategory::Driving => 0.25,
        }
    }
}

impl std::fmt::Display for SpeedCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeedCategory::Still => write!(f, "still"),
            SpeedCategory::Walking => write!(f, "walking"),
            SpeedCategory::Running => write!(f, "running"),
            SpeedCategory::Cycling => write!(f, "cycling"),
            SpeedCategory::Driving => write!(f, "driving"),
        }
    }
}

/// Sliding-window speed estimator.
#[derive(Debug, Clone)]
pub struct SpeedEstimator {
    history: VecDeque<f64>,
    estimate_mps: f64,
}

impl Default for SpeedEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeedEstimator {
    /// Create an estimator primed with the pedestrian default.
    pub fn new() -> Self {
        Self {
            history: VecDeque::with_capacity(MAX_SPEED_HISTORY),
            estimate_mps: DEFAULT_SPEED_MPS,
        }
    }

    /// Feed one movement observation.
    ///
    /// Returns `true` when the observation entered the window. Observations
    /// are discarded when the elapsed time is too short for a stable
    /// division or the implied speed is implausible (GPS jump).
    pub fn observe(&mut self, distance_moved_m: f64, elapsed: Duration) -> bool {
        if elapsed <= MIN_ELAPSED {
            return false;
        }

        let instant_speed = distance_moved_m / elapsed.as_secs_f64();
        if instant_speed >= MAX_PLAUSIBLE_SPEED_MPS {
            return false;
        }

        if self.history.len() == MAX_SPEED_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(instant_speed);

        self.estimate_mps = self.history.iter().sum::<f64>() / self.history.len() as f64;
        true
    }

    /// Smoothed speed estimate in m/s.
    pub fn estimate_mps(&self) -> f64 {
        self.estimate_mps
    }

    /// Smoothed speed estimate in km/h.
    pub fn estimate_kmh(&self) -> f64 {
        self.estimate_mps * 3.6
    }

    /// Current movement category.
    pub fn category(&self) -> SpeedCategory {
        SpeedCategory::for_kmh(self.estimate_kmh())
    }

    /// Forget all history and return to the default estimate.
    pub fn reset(&mut self) {
        self.history.clear();
        self.estimate_mps = DEFAULT_SPEED_MPS;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_thresholds() {
        assert_eq!(SpeedCategory::for_kmh(0.0), SpeedCategory::Still);
        assert_eq!(SpeedCategory::for_kmh(1.9), SpeedCategory::Still);
        assert_eq!(SpeedCategory::for_kmh(2.0), SpeedCategory::Walking);
        assert_eq!(SpeedCategory::for_kmh(6.9), SpeedCategory::Walking);
        assert_eq!(SpeedCategory::for_kmh(7.0), SpeedCategory::Running);
        assert_eq!(SpeedCategory::for_kmh(12.0), SpeedCategory::Cycling);
        assert_eq!(SpeedCategory::for_kmh(28.0), SpeedCategory::Driving);
        assert_eq!(SpeedCategory::for_kmh(120.0), SpeedCategory::Driving);
    }

    #[test]
    fn test_safety_factors_decrease_with_speed() {
        let factors = [
            SpeedCategory::Still.safety_factor(),
            SpeedCategory::Walking.safety_factor(),
            SpeedCategory::Running.safety_factor(),
            SpeedCategory::Cycling.safety_factor(),
            SpeedCategory::Driving.safety_factor(),
        ];
        assert!(factors.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_estimator_starts_at_walking_default() {
        let est = SpeedEstimator::new();
        assert_eq!(est.estimate_mps(), DEFAULT_SPEED_MPS);
        assert_eq!(est.category(), SpeedCategory::Walking);
    }

    #[test]
    fn test_estimator_averages_window() {
        let mut est = SpeedEstimator::new();
        assert!(est.observe(20.0, Duration::from_secs(10))); // 2 m/s
        assert!(est.observe(40.0, Duration::from_secs(10))); // 4 m/s
        assert!((est.estimate_mps() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_estimator_window_is_bounded() {
        let mut est = SpeedEstimator::new();
        // Five slow observations, then five fast ones: the slow ones must
        // have aged out completely.
        for _ in 0..5 {
            est.observe(10.0, Duration::from_secs(10)); // 1 m/s
        }
        for _ in 0..5 {
            est.observe(50.0, Duration::from_secs(10)); // 5 m/s
        }
        assert!((est.estimate_mps() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_estimator_rejects_gps_jump() {
        let mut est = SpeedEstimator::new();
        est.observe(20.0, Duration::from_secs(10)); // 2 m/s
        let before = est.estimate_mps();

        // 700m in 10s = 70 m/s, a jump artifact.
        assert!(!est.observe(700.0, Duration::from_secs(10)));
        assert_eq!(est.estimate_mps(), before);
    }

    #[test]
    fn test_estimator_rejects_short_elapsed() {
        let mut est = SpeedEstimator::new();
        assert!(!est.observe(5.0, Duration::from_millis(500)));
        assert_eq!(est.estimate_mps(), DEFAULT_SPEED_MPS);
    }

    #[test]
    fn test_estimator_reset() {
        let mut est = SpeedEstimator::new();
        est.observe(100.0, Duration::from_secs(10));
        est.reset();
        assert_eq!(est.estimate_mps(), DEFAULT_SPEED_MPS);
    }
}
