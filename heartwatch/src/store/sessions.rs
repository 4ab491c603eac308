//! The session store.
//!
//! One mutex guards the whole map. Expiry detection, refresh and eviction
//! all take it, so a refresh that completes before a sweep's expiry check
//! keeps the session alive for that pass.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::models::SessionRecord;

/// Liveness of a stored session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Liveness {
    /// Heartbeats are arriving.
    Active,
    /// Handed to the sweeper; waiting for eviction after the notification attempt.
    Expired,
}

#[derive(Debug)]
struct Entry {
    record: SessionRecord,
    liveness: Liveness,
}

#[derive(Debug, Default)]
struct Inner {
    sessions: HashMap<String, Entry>,
    next_epoch: u64,
}

/// Shared store of live sessions.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: Mutex<Inner>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session, replacing any record with the same id.
    pub async fn register(&self, mut record: SessionRecord) {
        let mut inner = self.inner.lock().await;
        inner.next_epoch += 1;
        record.epoch = inner.next_epoch;
        let session_id = record.session_id.clone();
        inner.sessions.insert(
            session_id,
            Entry {
                record,
                liveness: Liveness::Active,
            },
        );
    }

    /// Record a heartbeat at `now`.
    ///
    /// `last_seen` never moves backward. Sessions already handed to the
    /// sweeper count as gone.
    pub async fn refresh(&self, session_id: &str, now: Instant) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.sessions.get_mut(session_id) {
            Some(entry) if entry.liveness == Liveness::Active => {
                entry.record.last_seen = entry.record.last_seen.max(now);
                Ok(())
            }
            _ => Err(StoreError::NotFound(session_id.to_string())),
        }
    }

    /// Collect every active session silent for longer than `timeout`.
    ///
    /// Returned sessions are marked expired in the same critical section, so
    /// no record is returned twice and none can be refreshed afterwards. They
    /// stay in the map until [`SessionStore::evict`] is called.
    pub async fn sweep_expired(&self, now: Instant, timeout: Duration) -> Vec<SessionRecord> {
        let mut inner = self.inner.lock().await;
        inner
            .sessions
            .values_mut()
            .filter(|entry| {
                entry.liveness == Liveness::Active
                    && now.saturating_duration_since(entry.record.last_seen) > timeout
            })
            .map(|entry| {
                entry.liveness = Liveness::Expired;
                entry.record.clone()
            })
            .collect()
    }

    /// Remove a session previously returned by [`SessionStore::sweep_expired`].
    ///
    /// A record re-registered under the same id in the meantime is left alone.
    pub async fn evict(&self, record: &SessionRecord) -> bool {
        let mut inner = self.inner.lock().await;
        let matches = inner.sessions.get(&record.session_id).is_some_and(|entry| {
            entry.liveness == Liveness::Expired && entry.record.epoch == record.epoch
        });
        if matches {
            inner.sessions.remove(&record.session_id);
        }
        matches
    }

    /// Explicitly drop an active session.
    pub async fn remove(&self, session_id: &str) -> Option<SessionRecord> {
        let mut inner = self.inner.lock().await;
        match inner.sessions.get(session_id) {
            Some(entry) if entry.liveness == Liveness::Active => {
                inner.sessions.remove(session_id).map(|entry| entry.record)
            }
            _ => None,
        }
    }

    /// Snapshot of an active session.
    pub async fn get(&self, session_id: &str) -> Option<SessionRecord> {
        let inner = self.inner.lock().await;
        inner
            .sessions
            .get(session_id)
            .filter(|entry| entry.liveness == Liveness::Active)
            .map(|entry| entry.record.clone())
    }

    /// Whether any record (active or awaiting eviction) exists for `session_id`.
    pub async fn contains(&self, session_id: &str) -> bool {
        self.inner.lock().await.sessions.contains_key(session_id)
    }

    /// Number of records held, including those awaiting eviction.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
