//! Heartbeat sweeper.
//!
//! Each tick moves silent sessions from active to expired, hands them to the
//! worker pool for a single disconnect notification, and evicts them once
//! that attempt finishes, whatever its outcome.

mod clock;
mod pool;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::PatchError;
use crate::models::SessionRecord;
use crate::notify::DisconnectNotifier;
use crate::store::SessionStore;

pub use clock::{Clock, ManualClock, SystemClock};
pub use pool::{JobId, PooledJob, WorkerPool};

/// Timing and concurrency settings for the sweeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSettings {
    /// Silence after which a session is expired.
    pub timeout: Duration,
    /// Time between ticks.
    pub interval: Duration,
    /// Disconnect notifications allowed in flight at once.
    pub max_concurrent: usize,
}

impl SweepSettings {
    /// Settings with the interval at a third of the timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            interval: timeout / 3,
            max_concurrent: 8,
        }
    }
}

/// What happened to one expired session.
#[derive(Debug)]
pub struct Disconnect {
    pub session_id: String,
    /// The notification failure, if any.
    pub error: Option<PatchError>,
    /// Whether this attempt removed the record from the store.
    pub evicted: bool,
}

/// Periodic expiry scan over a [`SessionStore`].
pub struct Sweeper {
    store: Arc<SessionStore>,
    notifier: Arc<dyn DisconnectNotifier>,
    clock: Arc<dyn Clock>,
    pool: WorkerPool,
    settings: SweepSettings,
}

impl Sweeper {
    pub fn new(
        store: Arc<SessionStore>,
        notifier: Arc<dyn DisconnectNotifier>,
        clock: Arc<dyn Clock>,
        settings: SweepSettings,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            pool: WorkerPool::new(settings.max_concurrent),
            settings,
        }
    }

    /// Run one sweep.
    ///
    /// Returns handles to the dispatched notification jobs. The tick itself
    /// never waits on network I/O; callers may await the handles or drop them.
    pub async fn sweep_once(&self) -> Vec<PooledJob<Disconnect>> {
        let now = self.clock.now();
        let expired = self.store.sweep_expired(now, self.settings.timeout).await;
        if !expired.is_empty() {
            debug!(count = expired.len(), "sessions expired this tick");
        }

        expired
            .into_iter()
            .map(|session| {
                info!(
                    session_id = %session.session_id,
                    age_secs = session.age().num_seconds(),
                    "session timed out"
                );
                let store = self.store.clone();
                let notifier = self.notifier.clone();
                self.pool.spawn(disconnect(store, notifier, session))
            })
            .collect()
    }

    /// Sweep every interval until `shutdown` flips to `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            timeout_ms = millis(self.settings.timeout),
            interval_ms = millis(self.settings.interval),
            "heartbeat sweeper started"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    // Handles are dropped; jobs finish on their own.
                    self.sweep_once().await;
                }
            }
        }

        info!("heartbeat sweeper stopped");
    }

    /// Run the sweeper on its own task.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Notify once, then evict regardless of the outcome.
async fn disconnect(
    store: Arc<SessionStore>,
    notifier: Arc<dyn DisconnectNotifier>,
    session: SessionRecord,
) -> Disconnect {
    let error = notifier.notify_disconnected(&session).await.err();
    if let Some(ref e) = error {
        warn!(session_id = %session.session_id, error = %e, "disconnect patch failed");
    }

    let evicted = store.evict(&session).await;
    debug!(session_id = %session.session_id, evicted, "session evicted");

    Disconnect {
        session_id: session.session_id,
        error,
        evicted,
    }
}
