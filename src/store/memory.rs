//! In-memory participant store with failure injection, for tests.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::Mutex;
use uuid::Uuid;

use super::{NewParticipant, Participant, ParticipantStore, StoreError};

#[derive(Default)]
pub struct MemoryParticipantStore {
    rows: Mutex<BTreeMap<String, Participant>>,
    /// Names whose `set_balance` calls fail.
    failing_names: Mutex<HashSet<String>>,
    /// When set, every call fails.
    offline: AtomicBool,
    /// When set, only listing fails.
    list_failing: AtomicBool,
    set_balance_calls: AtomicUsize,
}

impl MemoryParticipantStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw row, bypassing validation (e.g. a legacy sex value).
    pub async fn seed(&self, name: &str, weight: f64, sex: &str, room: &str, bac: f64) {
        let row = Participant {
            id: Uuid::new_v4(),
            name: name.to_string(),
            weight,
            sex: sex.to_string(),
            room: room.to_string(),
            bac,
        };
        self.rows.lock().await.insert(row.name.clone(), row);
    }

    pub async fn get(&self, name: &str) -> Option<Participant> {
        self.rows.lock().await.get(name).cloned()
    }

    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    pub async fn fail_set_balance_for(&self, name: &str) {
        self.failing_names.lock().await.insert(name.to_string());
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_list_failing(&self, failing: bool) {
        self.list_failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_balance_calls(&self) -> usize {
        self.set_balance_calls.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ParticipantStore for MemoryParticipantStore {
    async fn create_participant(&self, participant: &NewParticipant) -> Result<(), StoreError> {
        self.check_online()?;
        let mut rows = self.rows.lock().await;
        if rows.contains_key(&participant.name) {
            return Err(StoreError::Duplicate(participant.name.clone()));
        }
        rows.insert(
            participant.name.clone(),
            Participant {
                id: Uuid::new_v4(),
                name: participant.name.clone(),
                weight: participant.weight,
                sex: participant.sex.as_str().to_string(),
                room: participant.room.clone(),
                bac: participant.bac.max(0.0),
            },
        );
        Ok(())
    }

    async fn list_with_positive_balance(&self) -> Result<Vec<Participant>, StoreError> {
        self.check_online()?;
        if self.list_failing.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let rows = self.rows.lock().await;
        let mut out: Vec<Participant> = rows.values().filter(|p| p.bac > 0.0).cloned().collect();
        out.sort_by(|a, b| a.room.cmp(&b.room).then_with(|| a.name.cmp(&b.name)));
        Ok(out)
    }

    async fn set_balance(&self, name: &str, bac: f64) -> Result<(), StoreError> {
        self.set_balance_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        if self.failing_names.lock().await.contains(name) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let mut rows = self.rows.lock().await;
        let row = rows
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        row.bac = bac.max(0.0);
        Ok(())
    }
}
