//! WebSocket handler — one viewer session.
//!
//! DESIGN
//! ======
//! On upgrade the socket is split. The sink goes to a writer task that owns
//! it and drains the connection's outbound buffer; the read loop stays here.
//! Every outbound frame, unicast reply or broadcast flush, travels through
//! the same buffer, so writes to one socket never interleave.
//!
//! Inbound text is handed to `services::session`, which returns the reply
//! (if any) for this viewer. The reply is queued through the dispatcher like
//! any other frame.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → register the outbound buffer, spawn the writer
//! 2. Text frames → session → optional unicast reply
//! 3. Close, read error, idle timeout, eviction, or writer exit → unregister,
//!    stop writer

use std::time::Duration;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{Sink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::frame::{Command, ProtocolError};
use crate::services::registry::{ConnectionHandle, Payload};
use crate::services::session;
use crate::state::AppState;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();
    let (sink, mut stream) = socket.split();

    let (tx, rx) = mpsc::channel::<Payload>(state.session.outbound_buffer);
    state.registry.register(ConnectionHandle::new(conn_id, tx)).await;
    let mut writer = tokio::spawn(write_loop(sink, rx, conn_id, state.session.write_timeout));

    let viewers = state.registry.len().await;
    info!(%conn_id, viewers, "ws: viewer connected");

    loop {
        tokio::select! {
            _ = &mut writer => {
                debug!(%conn_id, "ws: writer stopped");
                break;
            }
            next = tokio::time::timeout(state.session.idle_timeout, stream.next()) => {
                let msg = match next {
                    Ok(Some(Ok(msg))) => msg,
                    Ok(Some(Err(e))) => {
                        debug!(%conn_id, error = %e, "ws: read failed");
                        break;
                    }
                    Ok(None) => break,
                    Err(_) => {
                        info!(%conn_id, idle = ?state.session.idle_timeout, "ws: idle timeout");
                        break;
                    }
                };
                // Evicted by the dispatcher: no reply can be delivered.
                if !state.registry.contains(conn_id).await {
                    warn!(%conn_id, "ws: connection evicted; closing");
                    break;
                }
                match msg {
                    Message::Text(text) => {
                        debug!(%conn_id, bytes = text.len(), "ws: recv frame");
                        if let Some(reply) = session::process_inbound_text(&state, text.as_str()).await {
                            state.dispatcher.unicast(&reply, conn_id).await;
                        }
                    }
                    Message::Binary(_) => {
                        warn!(%conn_id, "ws: binary frame rejected");
                        let reply = Command::error_from(&ProtocolError::BinaryUnsupported);
                        state.dispatcher.unicast(&reply, conn_id).await;
                    }
                    Message::Close(_) => break,
                    Message::Ping(_) | Message::Pong(_) => {}
                }
            }
        }
    }

    let evicted = !state.registry.unregister(conn_id).await;
    writer.abort();
    info!(%conn_id, evicted, "ws: viewer disconnected");
}

// =============================================================================
// WRITER
// =============================================================================

/// Drain the outbound buffer into the socket until the buffer closes or a
/// write fails or times out.
async fn write_loop<S>(mut sink: S, mut rx: mpsc::Receiver<Payload>, conn_id: Uuid, write_timeout: Duration)
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    while let Some(payload) = rx.recv().await {
        debug!(%conn_id, bytes = payload.len(), "ws: send frame");
        match tokio::time::timeout(write_timeout, sink.send(Message::Text(payload.to_string().into()))).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!(%conn_id, error = %e, "ws: write failed");
                return;
            }
            Err(_) => {
                warn!(%conn_id, timeout = ?write_timeout, "ws: write timed out");
                return;
            }
        }
    }
    let _ = tokio::time::timeout(write_timeout, sink.close()).await;
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
