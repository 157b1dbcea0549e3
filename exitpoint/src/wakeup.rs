//! OS-delegated wake-up geofence for dormant reminders.
//!
//! Far from the target the engine should not run at all: a single coarse
//! circular region per reminder is handed to the OS, and the first entry
//! report wakes the tracking session. Already being close skips the OS
//! round trip entirely, and a failed registration wakes immediately rather
//! than leaving the reminder permanently dormant.

use std::collections::HashMap;

use thiserror::Error;

/// Radius of the delegated wake-up region.
pub const WAKEUP_RADIUS_M: f64 = 500.0;

/// Below this distance the gate starts tracking directly instead of
/// registering a region: OS entry detection is too coarse and too slow
/// this close in.
pub const DIRECT_START_DISTANCE_M: f64 = 600.0;

/// Region registration failure.
#[derive(Debug, Clone, Error)]
pub enum WakeupError {
    /// The platform refused the registration (permission, quota).
    #[error("region registration refused: {0}")]
    Refused(String),
}

/// Platform geofencing contract.
///
/// One circular region per id; re-registering an id replaces the region.
pub trait RegionHost: Send + Sync {
    /// Register a circular region; entry reports arrive via
    /// [`WakeupGate::on_region_enter`].
    fn register_region(
        &self,
        id: u64,
        lat: f64,
        lng: f64,
        radius_m: f64,
    ) -> Result<(), WakeupError>;

    /// Remove a region; unknown ids are a no-op.
    fn remove_region(&self, id: u64);
}

type WakeCallback = Box<dyn FnOnce() + Send>;

/// Snapshot of the gate's registrations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeupStatus {
    /// Ids with an armed region.
    pub registered_ids: Vec<u64>,
    /// True when at least one reminder is waiting on an OS region.
    pub sleeping: bool,
}

/// Per-reminder wake-up gate over a [`RegionHost`].
pub struct WakeupGate<H: RegionHost> {
    host: H,
    pending: HashMap<u64, WakeCallback>,
}

impl<H: RegionHost> WakeupGate<H> {
    /// Create a gate with no registrations.
    pub fn new(host: H) -> Self {
        Self {
            host,
            pending: HashMap::new(),
        }
    }

    /// Arm a wake-up for a reminder.
    ///
    /// Returns `true` when the callback already ran synchronously (close
    /// enough to skip the region, or registration failed and the fallback
    /// fired); `false` when the region is armed and the callback will run
    /// on entry.
    pub fn register(
        &mut self,
        id: u64,
        lat: f64,
        lng: f64,
        current_distance_m: Option<f64>,
        on_wake: WakeCallback,
    ) -> bool {
        if let Some(d) = current_distance_m {
            if d < DIRECT_START_DISTANCE_M {
                tracing::info!(id, distance_m = d, "Already close, waking directly");
                on_wake();
                return true;
            }
        }

        match self.host.register_region(id, lat, lng, WAKEUP_RADIUS_M) {
            Ok(()) => {
                tracing::info!(id, "Wake-up region armed");
                self.pending.insert(id, on_wake);
                false
            }
            Err(e) => {
                // Never leave a reminder dormant with no path to waking.
                tracing::warn!(id, error = %e, "Region registration failed, waking now");
                on_wake();
                true
            }
        }
    }

    /// Deliver an OS region-entry report. Fires the wake callback exactly
    /// once and removes the registration; unknown ids are ignored.
    pub fn on_region_enter(&mut self, id: u64) {
        if let Some(on_wake) = self.pending.remove(&id) {
            tracing::info!(id, "Region entered, waking");
            self.host.remove_region(id);
            on_wake();
        }
    }

    /// Disarm one reminder; idempotent.
    pub fn unregister(&mut self, id: u64) {
        if self.pending.remove(&id).is_some() {
            self.host.remove_region(id);
        }
    }

    /// Disarm everything; idempotent.
    pub fn unregister_all(&mut self) {
        for id in self.pending.keys() {
            self.host.remove_region(*id);
        }
        self.pending.clear();
    }

    /// Current registrations.
    pub fn status(&self) -> WakeupStatus {
        let mut registered_ids: Vec<u64> = self.pending.keys().copied().collect();
        registered_ids.sort_unstable();
        WakeupStatus {
            sleeping: !registered_ids.is_empty(),
            registered_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Records registrations; fails when told to.
    struct MockHost {
        fail: AtomicBool,
        registered: Mutex<Vec<u64>>,
        removed: Mutex<Vec<u64>>,
    }

    impl MockHost {
        fn new() -> Self {
            Self {
                fail: AtomicBool::new(false),
                registered: Mutex::new(Vec::new()),
                removed: Mutex::new(Vec::new()),
            }
        }
    }

    impl RegionHost for Arc<MockHost> {
        fn register_region(
            &self,
            id: u64,
            _lat: f64,
            _lng: f64,
            radius_m: f64,
        ) -> Result<(), WakeupError> {
            assert_eq!(radius_m, WAKEUP_RADIUS_M);
            if self.fail.load(Ordering::SeqCst) {
                return Err(WakeupError::Refused("denied".to_string()));
            }
            self.registered.lock().unwrap().push(id);
            Ok(())
        }

        fn remove_region(&self, id: u64) {
            self.removed.lock().unwrap().push(id);
        }
    }

    fn counting_callback() -> (WakeCallback, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (
            Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }),
            count,
        )
    }

    #[test]
    fn test_far_away_arms_region() {
        let host = Arc::new(MockHost::new());
        let mut gate = WakeupGate::new(host.clone());
        let (cb, count) = counting_callback();

        let woke = gate.register(1, 47.0, 8.0, Some(2_000.0), cb);
        assert!(!woke);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(*host.registered.lock().unwrap(), vec![1]);
        assert!(gate.status().sleeping);
    }

    #[test]
    fn test_close_by_wakes_synchronously() {
        let host = Arc::new(MockHost::new());
        let mut gate = WakeupGate::new(host.clone());
        let (cb, count) = counting_callback();

        let woke = gate.register(1, 47.0, 8.0, Some(450.0), cb);
        assert!(woke);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(host.registered.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_distance_arms_region() {
        let host = Arc::new(MockHost::new());
        let mut gate = WakeupGate::new(host.clone());
        let (cb, count) = counting_callback();

        assert!(!gate.register(1, 47.0, 8.0, None, cb));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_entry_fires_once_and_removes() {
        let host = Arc::new(MockHost::new());
        let mut gate = WakeupGate::new(host.clone());
        let (cb, count) = counting_callback();

        gate.register(7, 47.0, 8.0, None, cb);
        gate.on_region_enter(7);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(*host.removed.lock().unwrap(), vec![7]);
        assert!(!gate.status().sleeping);

        // A duplicate entry report is a no-op.
        gate.on_region_enter(7);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_registration_failure_wakes_immediately() {
        let host = Arc::new(MockHost::new());
        host.fail.store(true, Ordering::SeqCst);
        let mut gate = WakeupGate::new(host.clone());
        let (cb, count) = counting_callback();

        let woke = gate.register(1, 47.0, 8.0, Some(5_000.0), cb);
        assert!(woke);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let host = Arc::new(MockHost::new());
        let mut gate = WakeupGate::new(host.clone());
        let (cb, count) = counting_callback();

        gate.register(3, 47.0, 8.0, None, cb);
        gate.unregister(3);
        gate.unregister(3);
        assert_eq!(*host.removed.lock().unwrap(), vec![3]);

        // Entry after unregister must not fire the callback.
        gate.on_region_enter(3);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unregister_all() {
        let host = Arc::new(MockHost::new());
        let mut gate = WakeupGate::new(host.clone());
        for id in [1, 2, 3] {
            let (cb, _) = counting_callback();
            gate.register(id, 47.0, 8.0, None, cb);
        }
        assert_eq!(gate.status().registered_ids, vec![1, 2, 3]);

        gate.unregister_all();
        assert!(!gate.status().sleeping);
        assert_eq!(host.removed.lock().unwrap().len(), 3);
    }
}
