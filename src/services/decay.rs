//! Decay scheduler — ages every positive balance on a fixed period.
//!
//! DESIGN
//! ======
//! Each tick lists positive-balance participants, decays each one by the
//! configured period, persists it, and enqueues a single `updateBAC` snapshot
//! built from the participants that were persisted successfully.
//!
//! The loop uses `MissedTickBehavior::Delay`: a tick body that overruns the
//! period defers the next tick instead of bursting to catch up, and the body
//! never overlaps itself because it runs inline in the loop.
//!
//! ERROR HANDLING
//! ==============
//! A failed list aborts that tick only. A failed persist (or a record the BAC
//! engine rejects) drops that participant from this tick's snapshot and
//! carries on with the rest.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::queue::UpdateQueue;
use crate::bac;
use crate::frame::{BalanceMap, Command};
use crate::store::{Participant, ParticipantStore, StoreError};

// =============================================================================
// DECAY CLOCK
// =============================================================================

/// When the last decay tick completed. Lets read-only snapshots project
/// balances forward without persisting anything.
#[derive(Clone)]
pub struct DecayClock {
    last_tick: Arc<Mutex<Instant>>,
}

impl DecayClock {
    #[must_use]
    pub fn new() -> Self {
        Self { last_tick: Arc::new(Mutex::new(Instant::now())) }
    }

    pub async fn mark(&self) {
        *self.last_tick.lock().await = Instant::now();
    }

    pub async fn since_last_tick(&self) -> Duration {
        self.last_tick.lock().await.elapsed()
    }
}

impl Default for DecayClock {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// PROJECTION
// =============================================================================

/// A participant paired with their balance after decay.
#[derive(Debug, Clone)]
pub struct Projected {
    pub participant: Participant,
    pub bac: f64,
}

/// Decay each participant's stored balance by `elapsed`. Records the BAC
/// engine rejects are logged and left out.
#[must_use]
pub fn project(participants: Vec<Participant>, elapsed: Duration) -> Vec<Projected> {
    participants
        .into_iter()
        .filter_map(|participant| {
            match bac::decay(participant.bac, participant.weight, &participant.sex, elapsed) {
                Ok(bac) => Some(Projected { participant, bac }),
                Err(e) => {
                    warn!(participant = %participant.name, error = %e, "decay: skipping participant");
                    None
                }
            }
        })
        .collect()
}

/// Current balances of every positive-balance participant, decayed by the
/// time since the last tick. Read-only.
///
/// # Errors
///
/// Returns the store error if the participant list cannot be fetched.
pub async fn current_balances(store: &dyn ParticipantStore, clock: &DecayClock) -> Result<Vec<Projected>, StoreError> {
    let participants = store.list_with_positive_balance().await?;
    Ok(project(participants, clock.since_last_tick().await))
}

#[must_use]
pub fn balance_map(projected: &[Projected]) -> BalanceMap {
    projected
        .iter()
        .map(|p| (p.participant.name.clone(), p.bac))
        .collect()
}

// =============================================================================
// SCHEDULER
// =============================================================================

/// Outcome of one decay tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecayReport {
    pub updated: usize,
    pub skipped: usize,
}

#[derive(Clone)]
pub struct DecayScheduler {
    store: Arc<dyn ParticipantStore>,
    queue: UpdateQueue,
    clock: DecayClock,
    period: Duration,
}

impl DecayScheduler {
    #[must_use]
    pub fn new(store: Arc<dyn ParticipantStore>, queue: UpdateQueue, clock: DecayClock, period: Duration) -> Self {
        Self { store, queue, clock, period }
    }

    /// Run one decay cycle.
    ///
    /// # Errors
    ///
    /// Returns the store error if the participant list cannot be fetched;
    /// nothing is enqueued in that case.
    pub async fn tick(&self) -> Result<DecayReport, StoreError> {
        let participants = self.store.list_with_positive_balance().await?;
        let total = participants.len();

        let mut balances = BalanceMap::new();
        for projected in project(participants, self.period) {
            let name = projected.participant.name;
            match self.store.set_balance(&name, projected.bac).await {
                Ok(()) => {
                    balances.insert(name, projected.bac);
                }
                Err(e) => {
                    warn!(participant = %name, error = %e, "decay: persist failed; excluded from this cycle");
                }
            }
        }

        let report = DecayReport { updated: balances.len(), skipped: total - balances.len() };
        self.queue.enqueue(Command::UpdateBac(balances)).await;
        self.clock.mark().await;
        debug!(updated = report.updated, skipped = report.skipped, "decay: tick complete");
        Ok(report)
    }

    /// Run `tick` every period until `shutdown` fires.
    #[must_use]
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        info!(period = ?self.period, "decay scheduler started");
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + self.period, self.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = self.tick().await {
                            error!(error = %e, "decay: tick failed");
                        }
                    }
                }
            }
            info!("decay scheduler stopped");
        })
    }
}

#[cfg(test)]
#[path = "decay_test.rs"]
mod tests;
