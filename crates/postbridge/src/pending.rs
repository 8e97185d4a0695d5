//! Pending-request table — correlates outgoing requests with responses.
//!
//! Each entry pairs a uid with the oneshot sender that settles the
//! requester's future. An entry leaves the table exactly once: either
//! [`PendingRequests::complete`] on a matching response or
//! [`PendingRequests::abandon`] when the request times out. Both paths
//! remove the same entry, so the response/timeout race resolves to
//! first-writer-wins with no leak either way.

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::trace;

/// Outstanding requests for one bridge instance.
#[derive(Default)]
pub struct PendingRequests {
    entries: DashMap<u64, oneshot::Sender<Value>>,
}

impl PendingRequests {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new outstanding request, returning the receiver the
    /// requester awaits.
    pub fn insert(&self, uid: u64) -> oneshot::Receiver<Value> {
        let (tx, rx) = oneshot::channel();
        self.entries.insert(uid, tx);
        rx
    }

    /// Settle an outstanding request with its response value.
    ///
    /// Returns `false` when no entry exists for `uid` (already timed out, or
    /// a spurious response) — the caller ignores those.
    pub fn complete(&self, uid: u64, value: Value) -> bool {
        match self.entries.remove(&uid) {
            Some((_, tx)) => {
                // A failed send means the requester gave up between our
                // remove and its timeout removal; same outcome either way.
                if tx.send(value).is_err() {
                    trace!(uid, "requester no longer waiting");
                }
                true
            }
            None => false,
        }
    }

    /// Drop an outstanding request after its timeout elapsed.
    ///
    /// Returns `false` when the entry was already settled.
    pub fn abandon(&self, uid: u64) -> bool {
        self.entries.remove(&uid).is_some()
    }

    /// Number of outstanding requests.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no requests are outstanding.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
