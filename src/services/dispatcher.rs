//! Dispatcher — the single fan-out point for outbound frames.
//!
//! DESIGN
//! ======
//! `send` serializes nothing and writes nothing: it pushes an already
//! serialized payload into each destination's bounded outbound buffer with
//! `try_send`. Each buffer is drained by exactly one writer task, so a
//! broadcast and a unicast to the same connection can never interleave
//! mid-frame, and a slow viewer cannot stall delivery to the others.
//!
//! ERROR HANDLING
//! ==============
//! A full or closed buffer is a transport failure for that connection only:
//! it is unregistered and the send carries on with the remaining members.
//! Nothing is propagated to the caller beyond the delivery report.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};
use uuid::Uuid;

use super::registry::{ConnectionHandle, ConnectionRegistry, Payload};
use crate::frame::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    All,
    Connection(Uuid),
}

/// Outcome of one `send`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub evicted: Vec<Uuid>,
}

#[derive(Clone)]
pub struct Dispatcher {
    registry: ConnectionRegistry,
}

impl Dispatcher {
    #[must_use]
    pub fn new(registry: ConnectionRegistry) -> Self {
        Self { registry }
    }

    /// Queue `payload` for every connection in `destination`.
    pub async fn send(&self, payload: Payload, destination: Destination) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let mut deliver = |target: &ConnectionHandle| match target.tx.try_send(Arc::clone(&payload)) {
            Ok(()) => report.delivered += 1,
            Err(TrySendError::Full(_)) => {
                warn!(conn_id = %target.id, "dispatch: outbound buffer full; dropping connection");
                report.evicted.push(target.id);
            }
            Err(TrySendError::Closed(_)) => {
                debug!(conn_id = %target.id, "dispatch: connection closed; dropping");
                report.evicted.push(target.id);
            }
        };

        match destination {
            Destination::All => self.registry.for_each(&mut deliver).await,
            Destination::Connection(id) => {
                if let Some(target) = self.registry.get(id).await {
                    deliver(&target);
                }
            }
        }

        for id in &report.evicted {
            self.registry.unregister(*id).await;
        }
        report
    }

    /// Serialize `value` once and send it.
    ///
    /// # Errors
    ///
    /// Returns the serialization error; nothing is sent in that case.
    pub async fn send_json<T: Serialize + ?Sized>(
        &self,
        value: &T,
        destination: Destination,
    ) -> Result<DeliveryReport, serde_json::Error> {
        let json = serde_json::to_string(value)?;
        Ok(self.send(Payload::from(json), destination).await)
    }

    /// Send a single command to one connection.
    pub async fn unicast(&self, command: &Command, conn_id: Uuid) -> DeliveryReport {
        match self.send_json(command, Destination::Connection(conn_id)).await {
            Ok(report) => report,
            Err(e) => {
                warn!(%conn_id, error = %e, "dispatch: failed to serialize command");
                DeliveryReport::default()
            }
        }
    }
}

#[cfg(test)]
#[path = "dispatcher_test.rs"]
mod tests;
