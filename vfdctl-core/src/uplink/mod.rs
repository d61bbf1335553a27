//! Broker uplink
//!
//! Session state, the connection manager, and the command-topic
//! namespace. The manager is driven by the external control loop and
//! never blocks or retries on its own.

pub mod manager;
pub mod state;

pub use manager::{ConnectionManager, UplinkError, COMMAND_NAMESPACE};
pub use state::ConnectionState;
