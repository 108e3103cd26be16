//! Update queue — pending outbound commands awaiting the next flush.
//!
//! Producers (the decay scheduler and the session handlers) append; the flush
//! scheduler drains. `drain_all` swaps the buffer out under the lock, so an
//! entry enqueued before the drain returns is delivered exactly once.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::frame::Command;

#[derive(Clone, Default)]
pub struct UpdateQueue {
    pending: Arc<Mutex<Vec<Command>>>,
}

impl UpdateQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enqueue(&self, command: Command) {
        self.pending.lock().await.push(command);
    }

    /// Take every pending command in enqueue order, leaving the queue empty.
    pub async fn drain_all(&self) -> Vec<Command> {
        std::mem::take(&mut *self.pending.lock().await)
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.pending.lock().await.is_empty()
    }
}

#[cfg(test)]
#[path = "queue_test.rs"]
mod tests;
