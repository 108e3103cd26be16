//! Session service — what each inbound command does to shared state.
//!
//! DESIGN
//! ======
//! `process_inbound_text` decodes one frame, applies it, and returns the
//! command to unicast back to the sender (a snapshot for `init`, an error
//! frame for anything rejected, nothing for a successful mutation). The
//! websocket layer owns the transport; this module never touches a socket.
//!
//! Successful joins and drinks enqueue a fresh balance snapshot so every
//! viewer sees the change on the next flush.

use tracing::{debug, info, warn};

use crate::bac;
use crate::frame::{self, Command, Drink, ErrorCode, Inbound, Join, ProtocolError};
use crate::services::decay;
use crate::state::AppState;
use crate::store::{NewParticipant, StoreError};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ProtocolError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
        }
    }
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Decode and apply one inbound text frame. Returns the reply for the sender.
pub async fn process_inbound_text(state: &AppState, text: &str) -> Option<Command> {
    let inbound = match frame::decode(text) {
        Ok(inbound) => inbound,
        Err(e) => {
            warn!(error = %e, "session: rejected frame");
            return Some(Command::error_from(&e));
        }
    };

    let result = match inbound {
        Inbound::Join(join) => handle_join(state, join).await.map(|()| None),
        Inbound::Drink(drink) => handle_drink(state, drink).await.map(|()| None),
        Inbound::RequestInitialState => initial_state(state).await.map(Some),
    };

    match result {
        Ok(reply) => reply,
        Err(e) => {
            warn!(code = e.error_code(), error = %e, "session: command failed");
            Some(Command::error_from(&e))
        }
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Register a new participant with a zero balance.
///
/// # Errors
///
/// Returns the store error (e.g. a duplicate name).
pub async fn handle_join(state: &AppState, join: Join) -> Result<(), SessionError> {
    let participant = NewParticipant { name: join.name, weight: join.weight, sex: join.sex, room: join.room, bac: 0.0 };
    state.store.create_participant(&participant).await?;
    info!(participant = %participant.name, room = %participant.room, "session: participant joined");

    enqueue_snapshot(state).await;
    Ok(())
}

/// Apply one drink to the balance carried in the frame and persist it.
///
/// # Errors
///
/// Returns a validation error for inputs the BAC engine rejects and the store
/// error if the balance cannot be written.
pub async fn handle_drink(state: &AppState, drink: Drink) -> Result<(), SessionError> {
    let new_bac = bac::consume(drink.bac, drink.weight, &drink.sex, drink.volume, drink.strength)
        .map_err(ProtocolError::from)?;
    state.store.set_balance(&drink.name, new_bac).await?;
    info!(participant = %drink.name, bac = new_bac, "session: drink recorded");

    enqueue_snapshot(state).await;
    Ok(())
}

/// Current decayed balances for a viewer that just connected.
///
/// # Errors
///
/// Returns the store error if participants cannot be listed.
pub async fn initial_state(state: &AppState) -> Result<Command, SessionError> {
    let projected = decay::current_balances(state.store.as_ref(), &state.decay_clock).await?;
    Ok(Command::UpdateBac(decay::balance_map(&projected)))
}

/// Queue the stored balances of every positive-balance participant.
async fn enqueue_snapshot(state: &AppState) {
    match state.store.list_with_positive_balance().await {
        Ok(participants) => {
            let balances = participants.into_iter().map(|p| (p.name, p.bac)).collect();
            state.queue.enqueue(Command::UpdateBac(balances)).await;
            debug!("session: snapshot enqueued");
        }
        Err(e) => warn!(error = %e, "session: could not build snapshot after mutation"),
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
