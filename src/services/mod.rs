//! Services — the hub's core, independent of HTTP and websocket transport.
//!
//! ARCHITECTURE
//! ============
//! `session` applies inbound commands, `queue` collects outbound commands,
//! `flush` and `decay` are the two periodic schedulers, and `dispatcher`
//! delivers payloads to the connections held in `registry`.

pub mod decay;
pub mod dispatcher;
pub mod flush;
pub mod queue;
pub mod registry;
pub mod session;
