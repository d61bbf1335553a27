//! Connection lifecycle states

/// Where the uplink currently stands, ordered by establishment
/// progress
///
/// The link (physical interface) and the session (authenticated broker
/// connection) are tracked as one ladder: a session implies a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    /// Nothing brought up yet; connect-phase calls are rejected
    Uninitialized,
    /// Network interface is up, no broker session
    LinkReady,
    /// Broker session established and command topic subscribed
    SessionConnected,
}

impl ConnectionState {
    /// Whether `init` has completed successfully
    pub fn is_initialized(&self) -> bool {
        !matches!(self, Self::Uninitialized)
    }

    /// Whether a broker session is established
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::SessionConnected)
    }
}
