//! Participant read-only view.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;
use tracing::error;

use crate::bac::{self, Sex};
use crate::services::decay;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ParticipantView {
    pub name: String,
    pub room: String,
    pub sex: String,
    pub bac: f64,
    pub sober_in_secs: u64,
}

/// `GET /api/participants` — every positive-balance participant, decayed to now.
pub async fn list_participants(State(state): State<AppState>) -> Result<Json<Vec<ParticipantView>>, StatusCode> {
    let projected = decay::current_balances(state.store.as_ref(), &state.decay_clock)
        .await
        .map_err(|e| {
            error!(error = %e, "participants: list failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let views = projected
        .into_iter()
        .filter_map(|p| {
            // Projection already dropped rows with an unrecognized sex.
            let sex: Sex = p.participant.sex.parse().ok()?;
            Some(ParticipantView {
                name: p.participant.name,
                room: p.participant.room,
                sex: sex.as_str().to_string(),
                bac: p.bac,
                sober_in_secs: bac::time_until_sober(p.bac, sex).as_secs(),
            })
        })
        .collect();

    Ok(Json(views))
}

#[cfg(test)]
#[path = "participants_test.rs"]
mod tests;
