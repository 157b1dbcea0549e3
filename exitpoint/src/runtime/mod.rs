//! Async drivers for the synchronous engines.
//!
//! Each runtime owns one engine on a dedicated task, feeds it external
//! events in arrival order and executes the side effects it requests.
//! Observers receive callbacks through the `*Events` traits; shutdown is
//! cooperative via a [`CancellationToken`](tokio_util::sync::CancellationToken).

mod predictive;
mod wifi;

pub use predictive::{PredictiveEvents, PredictiveRuntime};
pub use wifi::{WifiEvents, WifiRuntime};
