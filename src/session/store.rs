//! Versioned diagram state storage.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Snapshot of a session's diagram.
///
/// Records are immutable once stored; a write swaps in a whole new record,
/// so readers always observe either the prior or the new state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramState {
    /// Full diagram document, opaque to this layer.
    pub xml: String,
    /// Per-session write counter, starting at 1.
    pub version: u64,
    /// Time of the write that produced this record.
    pub last_updated: DateTime<Utc>,
}

impl DiagramState {
    /// How long this record has gone without a write, relative to `now`.
    pub fn idle_for(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.last_updated
    }
}

/// Thread-safe in-memory map from session id to its latest diagram state.
///
/// There is no explicit create or delete: a session comes into existence on
/// its first write and disappears only through [`SessionStore::evict_expired`].
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<DiagramState>>>,
}

impl SessionStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the current state of a session.
    ///
    /// Returns `None` for a session that has never been written (or was evicted).
    pub fn read(&self, session_id: &str) -> Option<Arc<DiagramState>> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions.get(session_id).cloned()
    }

    /// Store `xml` as the new state of `session_id` and return its version.
    pub fn write(&self, session_id: &str, xml: impl Into<String>) -> u64 {
        self.write_at(session_id, xml, Utc::now())
    }

    /// Like [`SessionStore::write`] with an explicit timestamp.
    pub fn write_at(&self, session_id: &str, xml: impl Into<String>, now: DateTime<Utc>) -> u64 {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);

        let version = sessions.get(session_id).map_or(0, |s| s.version) + 1;
        sessions.insert(
            session_id.to_string(),
            Arc::new(DiagramState {
                xml: xml.into(),
                version,
                last_updated: now,
            }),
        );

        debug!(session = %session_id, version, "session state written");
        version
    }

    /// Remove every session whose last write is older than `now - ttl`.
    pub fn evict_expired(&self, ttl: Duration, now: DateTime<Utc>) {
        let cutoff = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_sub_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.retain(|id, state| {
            let keep = state.last_updated >= cutoff;
            if !keep {
                info!(
                    session = %id,
                    idle_secs = state.idle_for(now).num_seconds(),
                    "evicting expired session"
                );
            }
            keep
        });
    }

    /// Number of sessions currently held.
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
