//! Driver for the adaptive predictive-polling session.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::log::{TraceEntry, TraceRing};
use crate::position::LocationProvider;
use crate::predictive::{
    PredictiveScheduler, SchedulerConfig, SchedulerSnapshot, SessionStatistics, SpeedCategory,
};
use crate::target::Target;

/// Floor for the no-fix watchdog.
const MIN_WATCHDOG: Duration = Duration::from_secs(30);

/// Observer callbacks from a running predictive session.
///
/// Callbacks run on the session task; implementations must not block.
pub trait PredictiveEvents: Send + Sync {
    /// The session processed a sample.
    fn on_state_update(&self, _snapshot: &SchedulerSnapshot) {}

    /// A trace entry was produced.
    fn on_trace(&self, _entry: &TraceEntry) {}

    /// The proximity trigger fired; the session is over.
    fn on_trigger(&self, _stats: &SessionStatistics) {}
}

/// A running predictive session.
///
/// The request-fix / process / sleep cycle lives on one spawned task;
/// `stop()` cancels it at the next suspend point.
pub struct PredictiveRuntime {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    trace: Arc<Mutex<TraceRing>>,
}

impl PredictiveRuntime {
    /// Start a session against `target`.
    pub fn start(
        config: SchedulerConfig,
        target: Target,
        provider: Arc<dyn LocationProvider>,
        events: Arc<dyn PredictiveEvents>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let trace = Arc::new(Mutex::new(TraceRing::new()));

        let task_cancel = cancel.clone();
        let task_trace = trace.clone();
        let handle = tokio::spawn(async move {
            run_session(config, target, provider, events, task_trace, task_cancel).await;
        });

        Self {
            cancel,
            handle,
            trace,
        }
    }

    /// Request shutdown; idempotent.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Wait for the session task to finish.
    pub async fn join(self) {
        let _ = self.handle.await;
    }

    /// Trace entries so far, newest first.
    pub fn trace_entries(&self) -> Vec<TraceEntry> {
        self.trace.lock().unwrap().iter().cloned().collect()
    }
}

/// No-fix watchdog: well past the nominal interval means the provider has
/// stalled and the request is reissued.
fn watchdog_for(scheduler: &PredictiveScheduler) -> Duration {
    (scheduler.current_tier().nominal_interval() * 4).max(MIN_WATCHDOG)
}

async fn run_session(
    config: SchedulerConfig,
    target: Target,
    provider: Arc<dyn LocationProvider>,
    events: Arc<dyn PredictiveEvents>,
    trace: Arc<Mutex<TraceRing>>,
    cancel: CancellationToken,
) {
    let mut scheduler = PredictiveScheduler::new(config);
    scheduler.start(target);

    loop {
        let tier = scheduler.current_tier();
        let watchdog = watchdog_for(&scheduler);

        let outcome = tokio::select! {
            _ = cancel.cancelled() => break,
            outcome = tokio::time::timeout(
                watchdog,
                provider.request_single_fix(tier.priority()),
            ) => outcome,
        };

        let sample = match outcome {
            Err(_) => {
                tracing::warn!(
                    watchdog_secs = watchdog.as_secs(),
                    tier = %tier,
                    "No fix within watchdog, re-requesting"
                );
                let entry = TraceEntry::measurement(
                    Instant::now(),
                    0.0,
                    0.0,
                    0.0,
                    SpeedCategory::Still,
                    tier,
                    watchdog,
                )
                .with_event(format!("no fix within {}s", watchdog.as_secs()));
                events.on_trace(&entry);
                trace.lock().unwrap().push(entry);
                continue;
            }
            Ok(None) => {
                // Provider gave up for this cycle; retry after a nominal wait.
                tracing::debug!(tier = %tier, "Provider returned no fix");
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(tier.nominal_interval()) => {}
                }
                continue;
            }
            Ok(Some(sample)) => sample,
        };

        let Some(tick) = scheduler.on_sample(&sample) else {
            break;
        };

        {
            let mut ring = trace.lock().unwrap();
            for entry in &tick.entries {
                events.on_trace(entry);
                ring.push(entry.clone());
            }
        }
        events.on_state_update(&tick.snapshot);

        if let Some(stats) = &tick.trigger {
            events.on_trigger(stats);
            break;
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(tick.next_check) => {}
        }
    }

    scheduler.stop();
}
