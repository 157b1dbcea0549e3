//! End-to-end Wi-Fi departure detection over scripted collaborators.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use exitpoint::geo;
use exitpoint::position::{FixPriority, LocationProvider, PositionSample};
use exitpoint::runtime::{WifiEvents, WifiRuntime};
use exitpoint::snap::{RoadSnap, RouteResult, SnapError, SnapResult};
use exitpoint::{WifiConfig, WifiStatus};

const HOUSE: (f64, f64) = (47.0, 8.0);

/// Returns scripted fixes in order, `None` once the script runs out.
struct ScriptedProvider {
    samples: Mutex<Vec<PositionSample>>,
}

impl ScriptedProvider {
    fn new(mut samples: Vec<PositionSample>) -> Self {
        samples.reverse();
        Self {
            samples: Mutex::new(samples),
        }
    }
}

impl LocationProvider for ScriptedProvider {
    fn request_single_fix(
        &self,
        _priority: FixPriority,
    ) -> Pin<Box<dyn Future<Output = Option<PositionSample>> + Send + '_>> {
        let sample = self.samples.lock().unwrap().pop();
        Box::pin(async move { sample })
    }
}

/// Snap service that always fails, forcing distance-only evaluation.
struct UnreachableSnap;

impl RoadSnap for UnreachableSnap {
    fn snap_to_road(
        &self,
        _lat: f64,
        _lng: f64,
    ) -> Pin<Box<dyn Future<Output = Result<SnapResult, SnapError>> + Send + '_>> {
        Box::pin(async { Err(SnapError::Timeout) })
    }

    fn route(
        &self,
        _from_lat: f64,
        _from_lng: f64,
        _to_lat: f64,
        _to_lng: f64,
    ) -> Pin<Box<dyn Future<Output = Result<RouteResult, SnapError>> + Send + '_>> {
        Box::pin(async { Err(SnapError::Timeout) })
    }
}

#[derive(Default)]
struct Recorder {
    statuses: Mutex<Vec<String>>,
    triggers: AtomicUsize,
    last_distance: Mutex<Option<f64>>,
}

impl WifiEvents for Recorder {
    fn on_status(&self, status: &WifiStatus) {
        self.statuses.lock().unwrap().push(status.label().to_string());
    }

    fn on_trigger(&self, final_distance_m: f64) {
        self.triggers.fetch_add(1, Ordering::SeqCst);
        *self.last_distance.lock().unwrap() = Some(final_distance_m);
    }
}

impl Recorder {
    async fn wait_for_status(&self, label: &str) {
        while !self.statuses.lock().unwrap().iter().any(|s| s == label) {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

fn fix_at_distance(distance_m: f64) -> PositionSample {
    let (lat, lng) = geo::destination_point(HOUSE.0, HOUSE.1, 0.0, distance_m);
    PositionSample::new(lat, lng, 6.0, "gps")
}

#[tokio::test(start_paused = true)]
async fn test_departure_triggers_after_debounce() {
    // First fix acquires the house, second verifies the departure.
    let provider = Arc::new(ScriptedProvider::new(vec![
        PositionSample::new(HOUSE.0, HOUSE.1, 5.0, "gps"),
        fix_at_distance(250.0),
    ]));
    let recorder = Arc::new(Recorder::default());

    let runtime = WifiRuntime::start(
        WifiConfig::default(),
        provider,
        Arc::new(UnreachableSnap),
        recorder.clone(),
    );

    runtime.notify_wifi_available("home-net");
    recorder.wait_for_status("connected").await;

    runtime.notify_wifi_lost();
    recorder.wait_for_status("triggered").await;

    assert_eq!(recorder.triggers.load(Ordering::SeqCst), 1);
    let distance = recorder.last_distance.lock().unwrap().unwrap();
    assert!((distance - 250.0).abs() < 5.0, "distance was {}m", distance);

    // The full path ran through debounce and verification.
    let statuses = recorder.statuses.lock().unwrap().clone();
    let debounce_pos = statuses.iter().position(|s| s == "debouncing").unwrap();
    let verify_pos = statuses.iter().position(|s| s == "verifying").unwrap();
    assert!(debounce_pos < verify_pos);

    runtime.stop();
    runtime.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_brief_outage_never_triggers() {
    let provider = Arc::new(ScriptedProvider::new(vec![PositionSample::new(
        HOUSE.0, HOUSE.1, 5.0, "gps",
    )]));
    let recorder = Arc::new(Recorder::default());

    let runtime = WifiRuntime::start(
        WifiConfig::default(),
        provider,
        Arc::new(UnreachableSnap),
        recorder.clone(),
    );

    runtime.notify_wifi_available("home-net");
    recorder.wait_for_status("connected").await;

    // Wi-Fi flaps for 4s, well inside the 10s debounce.
    runtime.notify_wifi_lost();
    recorder.wait_for_status("debouncing").await;
    runtime.notify_wifi_available("home-net");

    // Wait past the debounce window; verification must never start.
    tokio::time::sleep(Duration::from_secs(30)).await;
    let statuses = recorder.statuses.lock().unwrap().clone();
    assert!(!statuses.iter().any(|s| s == "verifying"));
    assert_eq!(recorder.triggers.load(Ordering::SeqCst), 0);

    runtime.stop();
    runtime.join().await;
}
