//! Participant store — the durable record of every participant's balance.
//!
//! ARCHITECTURE
//! ============
//! The hub only talks to storage through `ParticipantStore`. Production wires
//! in the Postgres adapter; tests use the in-memory store. Every call may fail
//! independently, and callers never hold a registry or queue lock across one.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use uuid::Uuid;

use crate::bac::Sex;
use crate::frame::ErrorCode;

pub use postgres::PgParticipantStore;

// =============================================================================
// TYPES
// =============================================================================

/// A stored participant record.
///
/// `sex` is kept as stored text: rows written by older clients may carry a
/// category the BAC engine rejects, and that must surface per participant.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub id: Uuid,
    pub name: String,
    pub weight: f64,
    pub sex: String,
    pub room: String,
    pub bac: f64,
}

/// Fields for a participant that does not exist yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewParticipant {
    pub name: String,
    pub weight: f64,
    pub sex: Sex,
    pub room: String,
    pub bac: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("participant already exists: {0}")]
    Duplicate(String),
    #[error("participant not found: {0}")]
    NotFound(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Duplicate(_) => "E_DUPLICATE_PARTICIPANT",
            Self::NotFound(_) => "E_PARTICIPANT_NOT_FOUND",
            Self::Database(_) => "E_STORE",
        }
    }
}

// =============================================================================
// CONTRACT
// =============================================================================

#[async_trait::async_trait]
pub trait ParticipantStore: Send + Sync {
    /// Insert a new participant.
    async fn create_participant(&self, participant: &NewParticipant) -> Result<(), StoreError>;

    /// Every participant whose balance is strictly positive, ordered by room
    /// then name.
    async fn list_with_positive_balance(&self) -> Result<Vec<Participant>, StoreError>;

    /// Overwrite one participant's balance. Negative values are stored as 0.
    async fn set_balance(&self, name: &str, bac: f64) -> Result<(), StoreError>;
}
