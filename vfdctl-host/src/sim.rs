//! Simulated network collaborators
//!
//! [`SimNetwork`] and [`SimBroker`] implement the core's transport
//! traits in process. The broker double keeps its state behind a
//! shared cell so a test or rig can hold a cloned scripting handle
//! (inject messages, refuse handshakes, drop the session) after the
//! connection manager has taken ownership of the client.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use vfdctl_core::traits::{MessageHandler, NetworkLink, ProtocolClient};

/// MQTT-style topic filter match
///
/// `#` matches the remainder of the topic including the parent level;
/// `+` matches exactly one level.
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_parts = filter.split('/');
    let mut topic_parts = topic.split('/');
    loop {
        match (filter_parts.next(), topic_parts.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => {}
            (Some(part), Some(segment)) if part == segment => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

/// Always-healthy network interface
///
/// Script `link_up` and `fail_bring_up` before handing it to the
/// manager to exercise the failure paths.
pub struct SimNetwork {
    pub link_up: bool,
    pub fail_bring_up: bool,
    pub last_bring_up: Option<(u8, [u8; 6])>,
}

impl SimNetwork {
    pub fn new() -> Self {
        Self {
            link_up: true,
            fail_bring_up: false,
            last_bring_up: None,
        }
    }
}

impl Default for SimNetwork {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkLink for SimNetwork {
    fn bring_up(&mut self, select_pin: u8, mac: &[u8; 6]) -> Result<(), i32> {
        if self.fail_bring_up {
            return Err(-1);
        }
        self.last_bring_up = Some((select_pin, *mac));
        Ok(())
    }

    fn is_up(&mut self) -> bool {
        self.link_up
    }
}

#[derive(Default)]
struct BrokerInner {
    endpoint: Option<(String, u16)>,
    connected: bool,
    refusals_remaining: u32,
    refusal_code: i32,
    handshakes: u32,
    handler: Option<MessageHandler>,
    subscriptions: Vec<String>,
    pending: VecDeque<(String, Vec<u8>)>,
    published: Vec<(String, Vec<u8>)>,
}

/// In-process broker double
///
/// Clones share one broker: give one clone to the connection manager
/// and keep another as the scripting handle. Sessions are clean in
/// the MQTT sense, so subscriptions and queued messages die with the
/// session.
#[derive(Clone)]
pub struct SimBroker {
    inner: Rc<RefCell<BrokerInner>>,
}

impl SimBroker {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(BrokerInner::default())),
        }
    }

    /// Refuse the next `count` handshakes with `code`
    pub fn refuse_connects(&self, count: u32, code: i32) {
        let mut inner = self.inner.borrow_mut();
        inner.refusals_remaining = count;
        inner.refusal_code = code;
    }

    /// Kill the session from the broker side
    pub fn drop_session(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.connected = false;
        inner.subscriptions.clear();
        inner.pending.clear();
    }

    /// Queue a message for delivery on the next client poll
    ///
    /// Returns whether the session was connected with a matching
    /// subscription; otherwise the message is dropped, as a real
    /// broker would drop it.
    pub fn inject(&self, topic: &str, payload: &[u8]) -> bool {
        let mut inner = self.inner.borrow_mut();
        if !inner.connected {
            return false;
        }
        let matched = inner
            .subscriptions
            .iter()
            .any(|filter| topic_matches(filter, topic));
        if matched {
            inner
                .pending
                .push_back((topic.to_string(), payload.to_vec()));
        }
        matched
    }

    /// Messages the client has published so far
    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.inner.borrow().published.clone()
    }

    /// Accepted handshake count
    pub fn handshakes(&self) -> u32 {
        self.inner.borrow().handshakes
    }

    /// Live subscription filters
    pub fn subscriptions(&self) -> Vec<String> {
        self.inner.borrow().subscriptions.clone()
    }

    /// Broker endpoint the client was configured with
    pub fn endpoint(&self) -> Option<(String, u16)> {
        self.inner.borrow().endpoint.clone()
    }
}

impl Default for SimBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolClient for SimBroker {
    fn configure(&mut self, url: &str, port: u16) {
        self.inner.borrow_mut().endpoint = Some((url.to_string(), port));
    }

    fn poll(&mut self) {
        loop {
            // The cell borrow is released before the handler runs, so
            // a handler may call back into the broker.
            let (handler, topic, payload) = {
                let mut inner = self.inner.borrow_mut();
                let handler = match inner.handler {
                    Some(handler) => handler,
                    None => return,
                };
                match inner.pending.pop_front() {
                    Some((topic, payload)) => (handler, topic, payload),
                    None => return,
                }
            };
            handler(&topic, &payload);
        }
    }

    fn is_connected(&mut self) -> bool {
        self.inner.borrow().connected
    }

    fn connect(&mut self, _client_id: &str, _user: &str, _password: &str) -> Result<(), i32> {
        let mut inner = self.inner.borrow_mut();
        if inner.refusals_remaining > 0 {
            inner.refusals_remaining -= 1;
            return Err(inner.refusal_code);
        }
        // A fresh clean session: nothing survives from the last one.
        inner.connected = true;
        inner.handshakes += 1;
        inner.subscriptions.clear();
        inner.pending.clear();
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), i32> {
        let mut inner = self.inner.borrow_mut();
        if !inner.connected {
            return Err(-1);
        }
        inner.published.push((topic.to_string(), payload.to_vec()));
        // Publishes matching the client's own subscription loop back,
        // delivered on the next poll like any other message.
        let matched = inner
            .subscriptions
            .iter()
            .any(|filter| topic_matches(filter, topic));
        if matched {
            inner
                .pending
                .push_back((topic.to_string(), payload.to_vec()));
        }
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), i32> {
        let mut inner = self.inner.borrow_mut();
        if !inner.connected {
            return Err(-1);
        }
        let filter = topic.to_string();
        if !inner.subscriptions.contains(&filter) {
            inner.subscriptions.push(filter);
        }
        Ok(())
    }

    fn set_message_handler(&mut self, handler: MessageHandler) {
        self.inner.borrow_mut().handler = Some(handler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use proptest::prelude::*;

    use vfdctl_core::config::{BrokerSettings, DeviceSettings};
    use vfdctl_core::uplink::{
        ConnectionManager, ConnectionState, UplinkError, COMMAND_NAMESPACE,
    };

    #[test]
    fn test_topic_matching() {
        assert!(topic_matches("cmd/vfdctl/freq", "cmd/vfdctl/freq"));
        assert!(topic_matches("cmd/vfdctl/#", "cmd/vfdctl/freq"));
        assert!(topic_matches("cmd/vfdctl/#", "cmd/vfdctl/freq/set"));
        assert!(topic_matches("cmd/vfdctl/#", "cmd/vfdctl"));
        assert!(topic_matches("cmd/+/freq", "cmd/vfdctl/freq"));
        assert!(!topic_matches("cmd/vfdctl/freq", "cmd/vfdctl"));
        assert!(!topic_matches("cmd/vfdctl", "cmd/vfdctl/freq"));
        assert!(!topic_matches("cmd/+", "cmd/vfdctl/freq"));
        assert!(!topic_matches("other/#", "cmd/vfdctl/freq"));
    }

    proptest! {
        #[test]
        fn prop_topic_matches_itself(topic in "[a-z]{1,6}(/[a-z]{1,6}){0,3}") {
            prop_assert!(topic_matches(&topic, &topic));
        }

        #[test]
        fn prop_hash_matches_everything(topic in "[a-z]{1,6}(/[a-z]{1,6}){0,3}") {
            prop_assert!(topic_matches("#", &topic));
        }
    }

    fn connect_client(broker: &SimBroker) {
        let mut client = broker.clone();
        client.connect("unit1", "", "").unwrap();
        client.subscribe(COMMAND_NAMESPACE).unwrap();
    }

    #[test]
    fn test_inject_requires_connected_subscriber() {
        let broker = SimBroker::new();
        assert!(!broker.inject("cmd/vfdctl/freq", b"300"));

        connect_client(&broker);
        assert!(broker.inject("cmd/vfdctl/freq", b"300"));
        assert!(!broker.inject("status/other", b"1"));
    }

    #[test]
    fn test_session_drop_clears_broker_state() {
        let broker = SimBroker::new();
        connect_client(&broker);
        assert_eq!(broker.subscriptions().len(), 1);

        broker.drop_session();
        assert!(broker.subscriptions().is_empty());
        assert!(!broker.inject("cmd/vfdctl/freq", b"300"));
    }

    #[test]
    fn test_scripted_refusals_then_accept() {
        let broker = SimBroker::new();
        broker.refuse_connects(2, -7);
        let mut client = broker.clone();
        assert_eq!(client.connect("unit1", "", ""), Err(-7));
        assert_eq!(client.connect("unit1", "", ""), Err(-7));
        assert_eq!(client.connect("unit1", "", ""), Ok(()));
        assert_eq!(broker.handshakes(), 1);
    }

    static DISPATCHED: Mutex<Vec<(String, Vec<u8>)>> = Mutex::new(Vec::new());

    fn record_dispatch(topic: &str, payload: &[u8]) {
        if let Ok(mut messages) = DISPATCHED.lock() {
            messages.push((topic.to_string(), payload.to_vec()));
        }
    }

    #[test]
    fn test_poll_dispatches_queued_messages() {
        let broker = SimBroker::new();
        let mut client = broker.clone();
        client.set_message_handler(record_dispatch);
        connect_client(&broker);

        broker.inject("cmd/vfdctl/freq", b"300");
        broker.inject("cmd/vfdctl/accel", b"10");
        client.poll();

        let messages = DISPATCHED.lock().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].0, "cmd/vfdctl/freq");
        assert_eq!(messages[1].1, b"10");
    }

    static ECHOED: Mutex<Vec<(String, Vec<u8>)>> = Mutex::new(Vec::new());

    fn record_echo(topic: &str, payload: &[u8]) {
        if let Ok(mut messages) = ECHOED.lock() {
            messages.push((topic.to_string(), payload.to_vec()));
        }
    }

    #[test]
    fn test_matching_publish_loops_back() {
        let broker = SimBroker::new();
        let mut client = broker.clone();
        client.set_message_handler(record_echo);
        connect_client(&broker);

        client.publish("cmd/vfdctl/echo", b"1").unwrap();
        client.publish("vfd/freq", b"600").unwrap();
        client.poll();

        let messages = ECHOED.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, "cmd/vfdctl/echo");
        // Both publishes still reached the broker log.
        assert_eq!(broker.published().len(), 2);
    }

    static RIG_INBOX: Mutex<Vec<(String, Vec<u8>)>> = Mutex::new(Vec::new());

    fn remember_command(topic: &str, payload: &[u8]) {
        if let Ok(mut inbox) = RIG_INBOX.lock() {
            inbox.push((topic.to_string(), payload.to_vec()));
        }
    }

    #[test]
    fn test_manager_rides_simulated_broker() {
        let broker = SimBroker::new();
        let script = broker.clone();
        script.refuse_connects(1, -7);

        let mut manager = ConnectionManager::new(SimNetwork::new(), broker);
        manager.register_message_callback(Some(remember_command));
        manager
            .init(&BrokerSettings::default(), &DeviceSettings::default())
            .unwrap();

        assert_eq!(manager.connect(), Err(UplinkError::BrokerConnectFailed(-7)));
        assert_eq!(manager.connect(), Ok(ConnectionState::SessionConnected));
        assert_eq!(script.subscriptions(), [COMMAND_NAMESPACE]);
        assert_eq!(script.endpoint(), Some((String::from("none"), 1883)));

        assert!(script.inject("cmd/vfdctl/freq", b"300"));
        manager.connect().unwrap();
        {
            let inbox = RIG_INBOX.lock().unwrap();
            assert_eq!(inbox.len(), 1);
            assert_eq!(inbox[0].0, "cmd/vfdctl/freq");
            assert_eq!(inbox[0].1, b"300");
        }

        manager.publish("vfd/freq", b"600").unwrap();
        let published = script.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "vfd/freq");
    }
}
