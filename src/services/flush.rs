//! Flush scheduler — drains the update queue and broadcasts it as one frame.
//!
//! DESIGN
//! ======
//! Every period the whole queue is drained and serialized as a single JSON
//! array, in enqueue order, then broadcast. An empty queue produces no
//! network activity, so the outbound message rate is bounded by the period
//! regardless of how many events arrive.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::dispatcher::{Destination, Dispatcher};
use super::queue::UpdateQueue;

#[derive(Clone)]
pub struct FlushScheduler {
    queue: UpdateQueue,
    dispatcher: Dispatcher,
    period: Duration,
}

impl FlushScheduler {
    #[must_use]
    pub fn new(queue: UpdateQueue, dispatcher: Dispatcher, period: Duration) -> Self {
        Self { queue, dispatcher, period }
    }

    /// Run one flush cycle. Returns the number of commands broadcast.
    pub async fn tick(&self) -> usize {
        let batch = self.queue.drain_all().await;
        if batch.is_empty() {
            return 0;
        }

        match self.dispatcher.send_json(&batch, Destination::All).await {
            Ok(report) => {
                debug!(
                    commands = batch.len(),
                    delivered = report.delivered,
                    evicted = report.evicted.len(),
                    "flush: batch broadcast"
                );
                batch.len()
            }
            Err(e) => {
                error!(error = %e, commands = batch.len(), "flush: failed to serialize batch");
                0
            }
        }
    }

    /// Run `tick` every period until `shutdown` fires, then flush once more.
    #[must_use]
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        info!(period = ?self.period, "flush scheduler started");
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + self.period, self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        self.tick().await;
                    }
                }
            }

            let flushed = self.tick().await;
            info!(flushed, "flush scheduler stopped");
        })
    }
}

#[cfg(test)]
#[path = "flush_test.rs"]
mod tests;
