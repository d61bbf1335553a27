//! Broker session management
//!
//! [`ConnectionManager`] owns the network interface and the protocol
//! client and walks them up the [`ConnectionState`] ladder. It makes
//! exactly one attempt per call and never sleeps; the control loop
//! supplies the retry cadence.

use core::ptr;

use heapless::String;

use crate::config::{BrokerSettings, DeviceSettings, MAX_CREDENTIAL_LEN, MAX_DEVICE_NAME_LEN};
use crate::traits::{MessageHandler, NetworkLink, ProtocolClient};

use super::state::ConnectionState;

/// Topic filter for inbound command traffic
///
/// (Re-)subscribed after every successful broker handshake.
pub const COMMAND_NAMESPACE: &str = "cmd/vfdctl/#";

/// Why an uplink operation failed
///
/// Transport return codes are carried through unchanged for
/// diagnostics. Every case is recoverable by calling again on the
/// next loop tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UplinkError {
    /// The interface did not come up within its own timeout
    LinkInitFailed(i32),
    /// No usable physical link, or `init` has not succeeded yet
    LinkDown,
    /// The broker rejected the handshake; carries the transport code
    BrokerConnectFailed(i32),
    /// No session is open
    NotConnected,
    /// The transport failed to send; carries the transport code
    PublishFailed(i32),
}

impl core::fmt::Display for UplinkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::LinkInitFailed(code) => {
                write!(f, "network link initialization failed (code {})", code)
            }
            Self::LinkDown => write!(f, "network link is down"),
            Self::BrokerConnectFailed(code) => {
                write!(f, "broker refused connection (code {})", code)
            }
            Self::NotConnected => write!(f, "no broker session"),
            Self::PublishFailed(code) => write!(f, "publish failed (code {})", code),
        }
    }
}

/// Owns the link and broker client across the session lifecycle
///
/// All calls come from one control loop; nothing here blocks beyond
/// the transport's own internal timeouts.
pub struct ConnectionManager<L: NetworkLink, C: ProtocolClient> {
    link: L,
    client: C,
    state: ConnectionState,
    device_name: String<MAX_DEVICE_NAME_LEN>,
    user: String<MAX_CREDENTIAL_LEN>,
    password: String<MAX_CREDENTIAL_LEN>,
    handler: Option<MessageHandler>,
    subscribed: bool,
}

impl<L: NetworkLink, C: ProtocolClient> ConnectionManager<L, C> {
    pub fn new(link: L, client: C) -> Self {
        Self {
            link,
            client,
            state: ConnectionState::Uninitialized,
            device_name: String::new(),
            user: String::new(),
            password: String::new(),
            handler: None,
            subscribed: false,
        }
    }

    /// Current position on the state ladder
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Bring up the interface and point the client at the broker
    ///
    /// Idempotent: once initialized, further calls succeed without
    /// touching the hardware. A failed call leaves the manager
    /// uninitialized so the caller may try again.
    pub fn init(
        &mut self,
        broker: &BrokerSettings,
        device: &DeviceSettings,
    ) -> Result<(), UplinkError> {
        if self.state.is_initialized() {
            return Ok(());
        }
        self.link
            .bring_up(device.select_pin, device.mac.bytes())
            .map_err(UplinkError::LinkInitFailed)?;
        self.client.configure(broker.url.as_str(), broker.port);
        self.device_name = device.name.clone();
        self.user = broker.user.clone();
        self.password = broker.password.clone();
        self.state = ConnectionState::LinkReady;
        Ok(())
    }

    /// Make one attempt to reach `SessionConnected`
    ///
    /// Pumps protocol housekeeping first so keep-alives and queued
    /// inbound dispatch happen on every tick, connected or not. Fast
    /// path when the session is already open; fails fast with
    /// `LinkDown` when the interface has no link. Exactly one
    /// handshake attempt per call, with the retry cadence left to the
    /// caller.
    pub fn connect(&mut self) -> Result<ConnectionState, UplinkError> {
        if !self.state.is_initialized() {
            return Err(UplinkError::LinkDown);
        }
        self.client.poll();

        if self.client.is_connected() {
            if !self.subscribed {
                self.subscribed = self.client.subscribe(COMMAND_NAMESPACE).is_ok();
            }
            self.state = ConnectionState::SessionConnected;
            return Ok(ConnectionState::SessionConnected);
        }

        if !self.link.is_up() {
            self.state = ConnectionState::LinkReady;
            self.subscribed = false;
            return Err(UplinkError::LinkDown);
        }

        if let Err(code) = self.client.connect(
            self.device_name.as_str(),
            self.user.as_str(),
            self.password.as_str(),
        ) {
            self.state = ConnectionState::LinkReady;
            self.subscribed = false;
            return Err(UplinkError::BrokerConnectFailed(code));
        }

        // Subscription failure is not a session failure; it is retried
        // on the next call via the fast path.
        self.subscribed = self.client.subscribe(COMMAND_NAMESPACE).is_ok();
        self.state = ConnectionState::SessionConnected;
        Ok(ConnectionState::SessionConnected)
    }

    /// Publish one message to the broker
    ///
    /// Confirms the session is open before handing anything to the
    /// transport; a session lost since the last `connect` reports
    /// `NotConnected` here rather than pushing bytes into a dead
    /// socket.
    pub fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), UplinkError> {
        if !self.state.is_connected() {
            return Err(UplinkError::NotConnected);
        }
        if !self.client.is_connected() {
            self.state = ConnectionState::LinkReady;
            self.subscribed = false;
            return Err(UplinkError::NotConnected);
        }
        self.client
            .publish(topic, payload)
            .map_err(UplinkError::PublishFailed)
    }

    /// Install the inbound message callback
    ///
    /// `None` is rejected without effect, so an active registration
    /// cannot be cleared by mistake. Re-registering the current
    /// handler is a no-op; a different handler replaces it and, when a
    /// session is open, refreshes the command subscription.
    pub fn register_message_callback(&mut self, handler: Option<MessageHandler>) {
        let handler = match handler {
            Some(handler) => handler,
            None => return,
        };
        if let Some(current) = self.handler {
            if ptr::fn_addr_eq(current, handler) {
                return;
            }
        }
        self.handler = Some(handler);
        self.client.set_message_handler(handler);
        if self.state.is_connected() {
            self.subscribed = self.client.subscribe(COMMAND_NAMESPACE).is_ok();
        }
    }
}
