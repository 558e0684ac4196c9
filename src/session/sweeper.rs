//! Periodic eviction of abandoned sessions.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::SessionStore;

/// Default age after which an untouched session is evicted.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Default period between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Background task that evicts stale sessions from a [`SessionStore`].
///
/// The task only runs between [`ExpirySweeper::start`] and
/// [`ExpirySweeper::stop`]; [`ExpirySweeper::sweep_now`] runs a single pass
/// synchronously regardless.
pub struct ExpirySweeper {
    store: Arc<SessionStore>,
    ttl: Duration,
    interval: Duration,
    running: Option<(oneshot::Sender<()>, JoinHandle<()>)>,
}

impl ExpirySweeper {
    /// Create a stopped sweeper.
    pub fn new(store: Arc<SessionStore>, ttl: Duration, interval: Duration) -> Self {
        Self {
            store,
            ttl,
            interval,
            running: None,
        }
    }

    /// Configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether the background task is active.
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Run one eviction pass now. Returns the number of evicted sessions.
    pub fn sweep_now(&self) -> usize {
        sweep(&self.store, self.ttl)
    }

    /// Spawn the periodic task. Does nothing if already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.running.is_some() {
            return;
        }

        let (tx, mut rx) = oneshot::channel();
        let store = Arc::clone(&self.store);
        let ttl = self.ttl;
        // tokio's interval panics on a zero period.
        let period = self.interval.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick completes immediately; nothing can be stale yet.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = &mut rx => break,
                    _ = ticker.tick() => {
                        sweep(&store, ttl);
                    }
                }
            }
            debug!("expiry sweeper stopped");
        });

        info!(
            ttl_secs = ttl.as_secs(),
            interval_secs = period.as_secs(),
            "expiry sweeper started"
        );
        self.running = Some((tx, handle));
    }

    /// Stop the periodic task and wait for it to exit.
    pub async fn stop(&mut self) {
        if let Some((tx, handle)) = self.running.take() {
            let _ = tx.send(());
            let _ = handle.await;
        }
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        if let Some((_, handle)) = self.running.take() {
            handle.abort();
        }
    }
}

fn sweep(store: &SessionStore, ttl: Duration) -> usize {
    let before = store.len();
    store.evict_expired(ttl, Utc::now());
    let evicted = before.saturating_sub(store.len());
    if evicted > 0 {
        info!(evicted, remaining = store.len(), "expired sessions swept");
    } else {
        debug!(remaining = store.len(), "sweep found nothing to evict");
    }
    evicted
}
