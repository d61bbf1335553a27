//! Network link and broker transport

/// Callback invoked for each inbound broker message
///
/// Arguments are the topic and the raw payload bytes.
pub type MessageHandler = fn(&str, &[u8]);

/// The physical network interface
pub trait NetworkLink {
    /// Bring the interface up with the given chip-select pin and
    /// hardware address
    fn bring_up(&mut self, select_pin: u8, mac: &[u8; 6]) -> Result<(), i32>;

    /// Whether the interface currently has a usable link
    fn is_up(&mut self) -> bool;
}

/// A broker session over an already-configured transport
///
/// Implementations report transport-level failures as raw status
/// codes; the session layer folds them into its own error type.
pub trait ProtocolClient {
    /// Point the client at a broker endpoint
    fn configure(&mut self, url: &str, port: u16);

    /// Service the transport: keep-alives plus dispatch of any queued
    /// inbound messages
    fn poll(&mut self);

    /// Whether a session is currently established
    fn is_connected(&mut self) -> bool;

    /// Open a session, authenticating when `user` is non-empty
    fn connect(&mut self, client_id: &str, user: &str, password: &str) -> Result<(), i32>;

    /// Publish one message
    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), i32>;

    /// Subscribe to a topic filter
    fn subscribe(&mut self, topic: &str) -> Result<(), i32>;

    /// Install the inbound message callback, replacing any previous one
    fn set_message_handler(&mut self, handler: MessageHandler);
}
