//! Exitpoint - adaptive proximity triggering for location reminders
//!
//! This library turns a stream of position fixes and connectivity events
//! into a single, battery-proportional departure/arrival trigger. Polling
//! frequency adapts to distance and movement speed; sitting on the home
//! Wi-Fi costs nothing at all; far away, a coarse OS geofence keeps the
//! whole engine dormant.
//!
//! The synchronous engines ([`predictive::PredictiveScheduler`],
//! [`wifi::WifiMonitor`], [`wakeup::WakeupGate`]) are pure state machines;
//! the async drivers in [`runtime`] wire them to a location provider, the
//! road-snap service and tokio timers.

pub mod geo;
pub mod log;
pub mod position;
pub mod predictive;
pub mod runtime;
pub mod snap;
pub mod target;
pub mod timer;
pub mod trigger_line;
pub mod wakeup;
pub mod wifi;

pub use position::{ConnectivityEvent, FixPriority, LocationProvider, PositionSample};
pub use predictive::{PredictiveScheduler, SchedulerConfig, SessionStatistics};
pub use runtime::{PredictiveRuntime, WifiRuntime};
pub use target::{Target, TargetError};
pub use wifi::{WifiConfig, WifiMonitor, WifiStatus};
