//! Driver for the connectivity sleep controller.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::log::{TraceEntry, TraceRing};
use crate::position::{ConnectivityEvent, FixPriority, LocationProvider};
use crate::snap::RoadSnap;
use crate::timer::{TimerHost, TokioTimerHost};
use crate::wifi::{WifiCommand, WifiConfig, WifiEvent, WifiMonitor, WifiStatus, WifiTimer};

/// Observer callbacks from the running monitor.
///
/// Callbacks run on the monitor task; implementations must not block.
pub trait WifiEvents: Send + Sync {
    /// The monitor entered a new status.
    fn on_status(&self, _status: &WifiStatus) {}

    /// The departure trigger fired.
    fn on_trigger(&self, _final_distance_m: f64) {}

    /// A trace entry was produced.
    fn on_trace(&self, _entry: &TraceEntry) {}
}

/// A running connectivity monitor.
///
/// All state mutation happens on one spawned task; connectivity callbacks
/// from the platform are posted onto the same queue as timers, fixes and
/// snap results, so events are processed strictly in arrival order.
pub struct WifiRuntime {
    tx: UnboundedSender<WifiEvent>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    trace: Arc<Mutex<TraceRing>>,
}

impl WifiRuntime {
    /// Start monitoring.
    pub fn start(
        config: WifiConfig,
        provider: Arc<dyn LocationProvider>,
        snap: Arc<dyn RoadSnap>,
        events: Arc<dyn WifiEvents>,
    ) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let trace = Arc::new(Mutex::new(TraceRing::new()));

        let ctx = Context {
            tx: tx.clone(),
            timers: TokioTimerHost::new(tx.clone()),
            provider,
            snap,
            events,
            trace: trace.clone(),
        };

        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut monitor = WifiMonitor::new(config);
            ctx.execute(monitor.start());

            loop {
                let event = tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    event = rx.recv() => match event {
                        Some(event) => event,
                        None => break,
                    },
                };
                ctx.execute(monitor.handle(event, Instant::now()));
            }

            ctx.execute(monitor.stop());
            ctx.timers.cancel_all();
        });

        Self {
            tx,
            cancel,
            handle,
            trace,
        }
    }

    /// Feed a platform connectivity transition.
    pub fn notify_connectivity(&self, event: ConnectivityEvent) {
        let event = match event {
            ConnectivityEvent::WifiAvailable { ssid } => WifiEvent::WifiAvailable { ssid },
            ConnectivityEvent::WifiLost => WifiEvent::WifiLost,
        };
        let _ = self.tx.send(event);
    }

    /// Report that a Wi-Fi network became available.
    pub fn notify_wifi_available(&self, ssid: &str) {
        self.notify_connectivity(ConnectivityEvent::WifiAvailable {
            ssid: ssid.to_string(),
        });
    }

    /// Report that the active Wi-Fi network was lost.
    pub fn notify_wifi_lost(&self) {
        self.notify_connectivity(ConnectivityEvent::WifiLost);
    }

    /// Adjust the trigger-line tolerance of the running monitor.
    pub fn set_trigger_tolerance(&self, tolerance_m: f64) {
        let _ = self.tx.send(WifiEvent::SetTriggerTolerance(tolerance_m));
    }

    /// Request shutdown; idempotent.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Wait for the monitor task to finish.
    pub async fn join(self) {
        let _ = self.handle.await;
    }

    /// Trace entries so far, newest first.
    pub fn trace_entries(&self) -> Vec<TraceEntry> {
        self.trace.lock().unwrap().iter().cloned().collect()
    }
}

/// Everything needed to execute monitor commands.
struct Context {
    tx: UnboundedSender<WifiEvent>,
    timers: TokioTimerHost<WifiTimer, WifiEvent>,
    provider: Arc<dyn LocationProvider>,
    snap: Arc<dyn RoadSnap>,
    events: Arc<dyn WifiEvents>,
    trace: Arc<Mutex<TraceRing>>,
}

impl Context {
    fn execute(&self, commands: Vec<WifiCommand>) {
        for command in commands {
            match command {
                WifiCommand::RequestFix(purpose) => {
                    let provider = self.provider.clone();
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let event = match provider
                            .request_single_fix(FixPriority::HighAccuracy)
                            .await
                        {
                            Some(sample) => WifiEvent::Fix(purpose, sample),
                            None => WifiEvent::FixFailed(purpose),
                        };
                        let _ = tx.send(event);
                    });
                }
                WifiCommand::Schedule(timer, after) => self.timers.schedule(timer, after),
                WifiCommand::CancelTimers => self.timers.cancel_all(),
                WifiCommand::Snap { lat, lng } => {
                    let snap = self.snap.clone();
                    let tx = self.tx.clone();
                    tokio::spawn(async move {
                        let result = snap.snap_to_road(lat, lng).await;
                        let _ = tx.send(WifiEvent::SnapResolved(result));
                    });
                }
                WifiCommand::Publish(status) => self.events.on_status(&status),
                WifiCommand::Trigger { final_distance_m } => {
                    self.events.on_trigger(final_distance_m)
                }
                WifiCommand::Trace(entry) => {
                    self.events.on_trace(&entry);
                    self.trace.lock().unwrap().push(entry);
                }
            }
        }
    }
}
