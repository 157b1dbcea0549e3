//! Timer scheduling abstraction.
//!
//! State machines never sleep; they ask a [`TimerHost`] to post a timer
//! event back onto their queue later. Firing is just another queued event,
//! so timer outcomes are serialized with fixes and connectivity callbacks.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

/// Host-side timer scheduling.
///
/// `K` identifies the timer kind; arming a kind that is already pending
/// replaces the pending instance.
pub trait TimerHost<K>: Send + Sync {
    /// Arm a timer that posts its kind after `after`.
    fn schedule(&self, kind: K, after: Duration);

    /// Cancel every pending timer.
    fn cancel_all(&self);
}

/// Tokio-backed timer host posting events onto an unbounded queue.
///
/// Each armed timer is one spawned task racing its delay against a
/// per-kind [`CancellationToken`]; cancellation wins silently.
pub struct TokioTimerHost<K, E> {
    tx: UnboundedSender<E>,
    tokens: Mutex<HashMap<K, CancellationToken>>,
}

impl<K, E> TokioTimerHost<K, E>
where
    K: Eq + Hash + Clone + Send + 'static,
    E: From<K> + Send + 'static,
{
    /// Create a host that posts fired timers to `tx`.
    pub fn new(tx: UnboundedSender<E>) -> Self {
        Self {
            tx,
            tokens: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, E> TimerHost<K> for TokioTimerHost<K, E>
where
    K: Eq + Hash + Clone + Send + 'static,
    E: From<K> + Send + 'static,
{
    fn schedule(&self, kind: K, after: Duration) {
        let token = CancellationToken::new();
        if let Some(previous) = self
            .tokens
            .lock()
            .unwrap()
            .insert(kind.clone(), token.clone())
        {
            previous.cancel();
        }

        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(after) => {
                    // Receiver gone means the runtime stopped; nothing to do.
                    let _ = tx.send(E::from(kind));
                }
            }
        });
    }

    fn cancel_all(&self) {
        let mut tokens = self.tokens.lock().unwrap();
        for token in tokens.values() {
            token.cancel();
        }
        tokens.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Kind {
        A,
        B,
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Fired(Kind);

    impl From<Kind> for Fired {
        fn from(k: Kind) -> Self {
            Fired(k)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let host = TokioTimerHost::new(tx);

        host.schedule(Kind::A, Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(11)).await;

        assert_eq!(rx.recv().await, Some(Fired(Kind::A)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all_suppresses_delivery() {
        let (tx, mut rx) = mpsc::unbounded_channel::<Fired>();
        let host = TokioTimerHost::new(tx);

        host.schedule(Kind::A, Duration::from_secs(10));
        host.cancel_all();
        tokio::time::advance(Duration::from_secs(20)).await;
        tokio::task::yield_now().await;

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearming_replaces_pending_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let host = TokioTimerHost::new(tx);

        host.schedule(Kind::A, Duration::from_secs(5));
        host.schedule(Kind::A, Duration::from_secs(30));

        tokio::time::advance(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err(), "replaced timer must not fire");

        tokio::time::advance(Duration::from_secs(25)).await;
        assert_eq!(rx.recv().await, Some(Fired(Kind::A)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_kinds_are_independent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let host = TokioTimerHost::new(tx);

        host.schedule(Kind::A, Duration::from_secs(5));
        host.schedule(Kind::B, Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(rx.recv().await, Some(Fired(Kind::A)));

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(rx.recv().await, Some(Fired(Kind::B)));
    }
}
