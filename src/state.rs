//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor and
//! handed to the schedulers at startup. Every component the hub needs is
//! constructed once here and shared by handle; there are no globals.

use std::sync::Arc;

use crate::config::SessionConfig;
use crate::services::decay::DecayClock;
use crate::services::dispatcher::Dispatcher;
use crate::services::queue::UpdateQueue;
use crate::services::registry::ConnectionRegistry;
use crate::store::ParticipantStore;

/// Clone is required by Axum; all inner fields are cheap handles.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ParticipantStore>,
    pub registry: ConnectionRegistry,
    pub queue: UpdateQueue,
    pub dispatcher: Dispatcher,
    pub decay_clock: DecayClock,
    pub session: SessionConfig,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn ParticipantStore>, session: SessionConfig) -> Self {
        let registry = ConnectionRegistry::new();
        Self {
            store,
            dispatcher: Dispatcher::new(registry.clone()),
            registry,
            queue: UpdateQueue::new(),
            decay_clock: DecayClock::new(),
            session,
        }
    }
}
