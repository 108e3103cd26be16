//! Postgres-backed participant store.

use sqlx::PgPool;

use super::{NewParticipant, Participant, ParticipantStore, StoreError};

#[derive(Clone)]
pub struct PgParticipantStore {
    pool: PgPool,
}

impl PgParticipantStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ParticipantStore for PgParticipantStore {
    async fn create_participant(&self, participant: &NewParticipant) -> Result<(), StoreError> {
        let result = sqlx::query(
            "INSERT INTO participants (id, name, weight, sex, room, bac)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(uuid::Uuid::new_v4())
        .bind(&participant.name)
        .bind(participant.weight)
        .bind(participant.sex.as_str())
        .bind(&participant.room)
        .bind(participant.bac.max(0.0))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::Duplicate(participant.name.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_with_positive_balance(&self) -> Result<Vec<Participant>, StoreError> {
        let rows = sqlx::query_as::<_, (uuid::Uuid, String, f64, String, String, f64)>(
            "SELECT id, name, weight, sex, room, bac
             FROM participants
             WHERE bac > 0
             ORDER BY room ASC, name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, weight, sex, room, bac)| Participant { id, name, weight, sex, room, bac })
            .collect())
    }

    async fn set_balance(&self, name: &str, bac: f64) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE participants SET bac = $2, updated_at = now() WHERE name = $1")
            .bind(name)
            .bind(bac.max(0.0))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(name.to_string()));
        }
        Ok(())
    }
}
