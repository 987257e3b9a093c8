//! Pending-Call Table
//!
//! Maps request IDs to single-use completion slots. Owns ID allocation.
//!
//! Invariants:
//! - One completion per ID, ever. Completing removes the entry, so a second
//!   attempt finds nothing and is ignored.
//! - Once drained, the table refuses new registrations. A register racing a
//!   drain either gets drained or sees the closed flag and backs out, so no
//!   caller is left waiting on a slot nobody will fill.

use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::oneshot;

use crate::error::SocketError;
use crate::protocol::{Payload, RequestId};

/// What a waiting caller eventually receives
pub type Completion = std::result::Result<Payload, SocketError>;

pub struct PendingCalls {
    next_id: AtomicU64,
    entries: DashMap<RequestId, oneshot::Sender<Completion>>,
    closed: AtomicBool,
}

/// A registered call. Dropping it before completion removes its entry,
/// so an abandoned call doesn't hold a slot until session close.
pub struct PendingCall<'a> {
    table: &'a PendingCalls,
    id: RequestId,
    rx: oneshot::Receiver<Completion>,
}

impl PendingCalls {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: DashMap::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Allocate the next ID and create its entry
    pub fn register(&self) -> Result<PendingCall<'_>, SocketError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(SocketError::SessionClosed);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.entries.insert(id, tx);

        if self.closed.load(Ordering::SeqCst) {
            // Lost a race with drain_all
            self.entries.remove(&id);
            return Err(SocketError::SessionClosed);
        }

        Ok(PendingCall {
            table: self,
            id,
            rx,
        })
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Deliver an outcome to the caller waiting on `id`.
    ///
    /// Returns false when no such entry exists (unknown or already completed).
    pub fn complete(&self, id: RequestId, outcome: Completion) -> bool {
        match self.entries.remove(&id) {
            Some((_, tx)) => {
                if tx.send(outcome).is_err() {
                    tracing::debug!(id, "Caller went away before its response arrived");
                }
                true
            }
            None => {
                tracing::warn!(id, "Received response for unknown request");
                false
            }
        }
    }

    /// Remove an entry without completing it
    pub fn forget(&self, id: RequestId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Fail every pending entry and refuse new ones. Returns how many were failed.
    pub fn drain_all(&self, make_error: impl Fn() -> SocketError) -> usize {
        self.closed.store(true, Ordering::SeqCst);

        let ids: Vec<RequestId> = self.entries.iter().map(|entry| *entry.key()).collect();
        let mut drained = 0;
        for id in ids {
            if let Some((_, tx)) = self.entries.remove(&id) {
                let _ = tx.send(Err(make_error()));
                drained += 1;
            }
        }
        drained
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PendingCalls {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingCall<'_> {
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Wait for the completion slot to be filled
    pub async fn wait(mut self) -> Completion {
        match (&mut self.rx).await {
            Ok(outcome) => outcome,
            // Sender dropped without a value: the entry was torn down
            Err(_) => Err(SocketError::SessionClosed),
        }
    }
}

impl fmt::Debug for PendingCall<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCall").field("id", &self.id).finish()
    }
}

impl Drop for PendingCall<'_> {
    fn drop(&mut self) {
        self.table.forget(self.id);
    }
}
