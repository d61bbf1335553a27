//! Settings records for the gateway
//!
//! Device identity, broker credentials, and the optional fieldbus serial
//! link. All string fields are fixed-capacity: over-length document text
//! is truncated when the model is populated, never rejected. Serde field
//! names match the document keys so a re-serialized record parses back.

use core::fmt;
use core::fmt::Write as _;

use heapless::String;
use serde::{Serialize, Serializer};

use super::registers::RegisterCatalog;

/// Maximum device-name length
pub const MAX_DEVICE_NAME_LEN: usize = 16;

/// Maximum broker user/password length
pub const MAX_CREDENTIAL_LEN: usize = 32;

/// Maximum broker address length
pub const MAX_BROKER_URL_LEN: usize = 64;

/// Device name used when the document names none
pub const DEFAULT_DEVICE_NAME: &str = "vfdctl";

/// Broker address used when the document names none
pub const DEFAULT_BROKER_URL: &str = "none";

/// Broker port used when the document names none
pub const DEFAULT_BROKER_PORT: u16 = 1883;

/// Reconnect cadence in seconds used when the document names none
pub const DEFAULT_RETRY_INTERVAL_SECS: u16 = 5;

/// Hardware address used when the document names none
// TODO: read the burned-in address from the network module instead of
// shipping a fixed constant
pub const DEFAULT_MAC: MacAddress = MacAddress([0x60, 0x52, 0xD0, 0x06, 0x70, 0x27]);

/// Chip-select pin used when the document names none
pub const DEFAULT_SELECT_PIN: u8 = 5;

/// Canonical 6-byte hardware address
///
/// The document carries the MAC as colon- or dash-delimited hex text;
/// [`MacAddress::parse`] is the adaptation step. The bytes are handed to
/// the network link exactly once, at connection-manager init.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Parse from text such as `60:52:D0:06:70:27` or `60-52-d0-06-70-27`
    ///
    /// Exactly six hex octets separated by `:` or `-`; anything else is
    /// `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut bytes = [0u8; 6];
        let mut parts = text.split(|c| c == ':' || c == '-');
        for slot in bytes.iter_mut() {
            let part = parts.next()?;
            let valid = !part.is_empty()
                && part.len() <= 2
                && part.bytes().all(|b| b.is_ascii_hexdigit());
            if !valid {
                return None;
            }
            *slot = u8::from_str_radix(part, 16).ok()?;
        }
        if parts.next().is_some() {
            return None;
        }
        Some(Self(bytes))
    }

    /// Raw bytes in transmission order
    pub fn bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

impl Default for MacAddress {
    fn default() -> Self {
        DEFAULT_MAC
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl Serialize for MacAddress {
    // Serialized in the same text form the document uses.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut text: String<17> = String::new();
        write!(&mut text, "{}", self).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

/// Device identity settings
///
/// Populated once at load time, immutable afterward.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceSettings {
    /// Device name, doubles as the broker client identifier
    #[serde(rename = "device_name")]
    pub name: String<MAX_DEVICE_NAME_LEN>,
    /// Hardware address handed to the network link
    #[serde(rename = "device_mac")]
    pub mac: MacAddress,
    /// SPI chip-select pin for the storage/network module
    pub select_pin: u8,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            name: String::try_from(DEFAULT_DEVICE_NAME).unwrap_or_default(),
            mac: DEFAULT_MAC,
            select_pin: DEFAULT_SELECT_PIN,
        }
    }
}

/// Broker connection settings
///
/// Owned by [`Configuration`]; the connection manager copies what it
/// needs at init time and never writes back.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BrokerSettings {
    /// Account user name, possibly empty
    #[serde(rename = "broker_user")]
    pub user: String<MAX_CREDENTIAL_LEN>,
    /// Account password, possibly empty
    #[serde(rename = "broker_pass")]
    pub password: String<MAX_CREDENTIAL_LEN>,
    /// Broker host name or address
    #[serde(rename = "broker_url")]
    pub url: String<MAX_BROKER_URL_LEN>,
    /// Broker port
    #[serde(rename = "broker_port")]
    pub port: u16,
    /// Reconnect cadence in seconds, advisory for the control loop
    #[serde(rename = "broker_retry_interval_sec")]
    pub retry_interval_secs: u16,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            user: String::new(),
            password: String::new(),
            url: String::try_from(DEFAULT_BROKER_URL).unwrap_or_default(),
            port: DEFAULT_BROKER_PORT,
            retry_interval_secs: DEFAULT_RETRY_INTERVAL_SECS,
        }
    }
}

/// Parity for the fieldbus serial link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    #[default]
    None,
    Even,
    Odd,
}

impl Parity {
    /// Canonical text name
    pub fn as_text(&self) -> &'static str {
        match self {
            Parity::None => "none",
            Parity::Even => "even",
            Parity::Odd => "odd",
        }
    }

    /// Parse from text; unrecognized maps to `None`
    pub fn from_text(text: &str) -> Self {
        match text {
            "even" => Parity::Even,
            "odd" => Parity::Odd,
            _ => Parity::None,
        }
    }
}

/// Flow control for the fieldbus serial link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum FlowControl {
    #[default]
    None,
    Hardware,
    Software,
}

impl FlowControl {
    /// Canonical text name
    pub fn as_text(&self) -> &'static str {
        match self {
            FlowControl::None => "none",
            FlowControl::Hardware => "hardware",
            FlowControl::Software => "software",
        }
    }

    /// Parse from text; unrecognized maps to `None`
    pub fn from_text(text: &str) -> Self {
        match text {
            "hardware" => FlowControl::Hardware,
            "software" => FlowControl::Software,
            _ => FlowControl::None,
        }
    }
}

/// Serial link parameters for the fieldbus side
///
/// Every field defaults independently; the whole record is optional in
/// the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialLinkSettings {
    /// Baud rate
    pub baud_rate: u32,
    /// Data bits per character
    pub data_bits: u8,
    /// Parity mode
    pub parity: Parity,
    /// Stop bits
    pub stop_bits: u8,
    /// Flow control mode
    pub flow_control: FlowControl,
}

impl Default for SerialLinkSettings {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
            flow_control: FlowControl::None,
        }
    }
}

/// Complete gateway configuration
///
/// Built once per boot by the loader; a re-load replaces the whole
/// aggregate. `formed` distinguishes a successful load from a
/// default-constructed value. Serialization emits the document shape,
/// with the serial link and register arrays nested under `modbus`.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Configuration {
    /// Device identity
    pub device: DeviceSettings,
    /// Broker connection settings
    pub broker: BrokerSettings,
    /// Fieldbus serial link, when the document configures one
    pub serial_link: Option<SerialLinkSettings>,
    /// Register catalog
    pub registers: RegisterCatalog,
    /// True when this value came from a successfully parsed document
    pub formed: bool,
}
