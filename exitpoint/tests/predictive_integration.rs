//! End-to-end predictive session over a scripted location provider.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use exitpoint::geo;
use exitpoint::position::{FixPriority, LocationProvider, PositionSample};
use exitpoint::predictive::{SchedulerSnapshot, SessionStatistics};
use exitpoint::runtime::{PredictiveEvents, PredictiveRuntime};
use exitpoint::{SchedulerConfig, Target};

const TARGET: (f64, f64) = (47.0, 8.0);

/// Returns scripted samples in order, `None` once the script runs out.
struct ScriptedProvider {
    samples: Mutex<Vec<PositionSample>>,
}

impl ScriptedProvider {
    /// Samples approaching the target from the north, 30s apart.
    fn approaching(distances_m: &[f64]) -> Self {
        let base = Instant::now();
        let samples = distances_m
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let (lat, lng) = geo::destination_point(TARGET.0, TARGET.1, 0.0, *d);
                PositionSample::with_timestamp(
                    lat,
                    lng,
                    5.0,
                    "gps",
                    base + Duration::from_secs(30 * i as u64),
                )
            })
            .rev()
            .collect();
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

/// Provider that never produces a fix.
struct SilentProvider;

impl LocationProvider for SilentProvider {
    fn request_single_fix(
        &self,
        _priority: FixPriority,
    ) -> Pin<Box<dyn Future<Output = Option<PositionSample>> + Send + '_>> {
        Box::pin(futures::future::pending())
    }
}

#[derive(Default)]
struct Recorder {
    snapshots: Mutex<Vec<SchedulerSnapshot>>,
    triggers: AtomicUsize,
    last_stats: Mutex<Option<SessionStatistics>>,
}

impl PredictiveEvents for Recorder {
    fn on_state_update(&self, snapshot: &SchedulerSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot.clone());
    }

    fn on_trigger(&self, stats: &SessionStatistics) {
        self.triggers.fetch_add(1, Ordering::SeqCst);
        *self.last_stats.lock().unwrap() = Some(stats.clone());
    }
}

fn target() -> Target {
    Target::new(TARGET.0, TARGET.1, 10.0).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_walking_approach_triggers_once() {
    let provider = Arc::new(ScriptedProvider::approaching(&[
        600.0, 450.0, 250.0, 120.0, 40.0, 8.0,
    ]));
    let recorder = Arc::new(Recorder::default());

    let runtime = PredictiveRuntime::start(
        SchedulerConfig::default(),
        target(),
        provider,
        recorder.clone(),
    );
    runtime.join().await;

    assert_eq!(recorder.triggers.load(Ordering::SeqCst), 1);

    let snapshots = recorder.snapshots.lock().unwrap();
    assert_eq!(snapshots.len(), 6);

    // Distances shrink monotonically in this script.
    for pair in snapshots.windows(2) {
        assert!(pair[1].distance_to_target_m < pair[0].distance_to_target_m);
    }

    let stats = recorder.last_stats.lock().unwrap().clone().unwrap();
    assert_eq!(stats.check_count, 6);
    assert!(stats.start_distance_m > 550.0);
    assert!(stats.trigger_distance_m <= 10.0);
}

#[tokio::test(start_paused = true)]
async fn test_trace_records_session() {
    let provider = Arc::new(ScriptedProvider::approaching(&[300.0, 150.0, 5.0]));
    let recorder = Arc::new(Recorder::default());

    let runtime = PredictiveRuntime::start(
        SchedulerConfig::default(),
        target(),
        provider,
        recorder.clone(),
    );

    // Wait for the trigger without consuming the runtime.
    while recorder.triggers.load(Ordering::SeqCst) == 0 {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    let entries = runtime.trace_entries();
    assert!(entries.len() >= 3);
    assert!(entries
        .iter()
        .any(|e| e.event.as_deref().is_some_and(|s| s.starts_with("TRIGGER"))));

    runtime.join().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_stalled_session() {
    let recorder = Arc::new(Recorder::default());
    let runtime = PredictiveRuntime::start(
        SchedulerConfig::default(),
        target(),
        Arc::new(SilentProvider),
        recorder.clone(),
    );

    // Let a couple of watchdog cycles pass, then shut down.
    tokio::time::sleep(Duration::from_secs(3_000)).await;
    assert!(runtime
        .trace_entries()
        .iter()
        .any(|e| e.event.as_deref().is_some_and(|s| s.starts_with("no fix"))));
    runtime.stop();
    runtime.stop();
    runtime.join().await;

    assert_eq!(recorder.triggers.load(Ordering::SeqCst), 0);
}
