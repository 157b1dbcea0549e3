//! Adaptive predictive-polling engine.
//!
//! Turns a stream of position samples into a battery-proportional polling
//! schedule and a one-time proximity trigger:
//!
//! ```text
//! sample ──► speed estimate ──► movement category ─┐
//!    │                                             ├─► next-check delay
//!    └─► distance to target ──► precision tier ────┘
//!                │
//!                └─► trigger decision (zone + accuracy gate)
//! ```
//!
//! See [`PredictiveScheduler`] for the per-sample algorithm.

mod scheduler;
mod snapshot;
mod speed;
mod tier;

pub use scheduler::{PredictiveScheduler, SchedulerConfig, SchedulerState, SchedulerTick};
pub use snapshot::{SchedulerSnapshot, SessionStatistics};
pub use speed::{SpeedCategory, SpeedEstimator, DEFAULT_SPEED_MPS};
pub use tier::PrecisionTier;
