//! Connection registry — the set of live viewer connections.
//!
//! DESIGN
//! ======
//! A connection is represented by its id plus the sending half of its bounded
//! outbound buffer. The socket itself is owned by the connection's writer
//! task, so nothing here ever performs network I/O.
//!
//! Iteration works on a snapshot: members are cloned under the lock and the
//! lock is released before the caller sends anything. A connection added or
//! removed during a broadcast may or may not receive that broadcast.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

/// Serialized outbound frame, shared across every destination of a send.
pub type Payload = Arc<str>;

/// Handle to one live connection's outbound buffer.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    pub id: Uuid,
    pub tx: mpsc::Sender<Payload>,
}

impl ConnectionHandle {
    #[must_use]
    pub fn new(id: Uuid, tx: mpsc::Sender<Payload>) -> Self {
        Self { id, tx }
    }
}

#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    members: Arc<RwLock<HashMap<Uuid, ConnectionHandle>>>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection. Re-registering an id replaces its handle.
    pub async fn register(&self, handle: ConnectionHandle) {
        self.members.write().await.insert(handle.id, handle);
    }

    /// Remove a connection. Returns whether it was present; removing an
    /// absent connection is a no-op.
    pub async fn unregister(&self, id: Uuid) -> bool {
        self.members.write().await.remove(&id).is_some()
    }

    pub async fn get(&self, id: Uuid) -> Option<ConnectionHandle> {
        self.members.read().await.get(&id).cloned()
    }

    /// Point-in-time copy of every member.
    pub async fn snapshot(&self) -> Vec<ConnectionHandle> {
        self.members.read().await.values().cloned().collect()
    }

    /// Visit a snapshot of the members. The lock is not held while `f` runs.
    pub async fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&ConnectionHandle),
    {
        for handle in self.snapshot().await {
            f(&handle);
        }
    }

    pub async fn len(&self) -> usize {
        self.members.read().await.len()
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.members.read().await.is_empty()
    }

    pub async fn contains(&self, id: Uuid) -> bool {
        self.members.read().await.contains_key(&id)
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
