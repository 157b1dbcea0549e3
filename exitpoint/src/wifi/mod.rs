//! Wi-Fi-presence-driven sleep and departure detection.
//!
//! While the phone sits on the home network the engine sleeps entirely; a
//! debounced loss of that network starts a short verification cascade that
//! either confirms a departure (trigger), recognizes a router outage, or
//! tracks ambiguous movement until the picture clears.
//!
//! The state machine itself ([`WifiMonitor`]) is synchronous and pure; the
//! async driver lives in [`crate::runtime`].

mod config;
mod controller;
mod home;
mod status;

pub use config::WifiConfig;
pub use controller::{FixPurpose, WifiCommand, WifiEvent, WifiMonitor, WifiTimer};
pub use home::{HomeGeometry, RoadGeometry, IGNORE_SNAP_BELOW_M};
pub use status::WifiStatus;
