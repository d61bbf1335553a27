//! Raw configuration document
//!
//! Zero-copy view of the JSON document as it sits in the read buffer:
//! every field optional, strings borrowed. Conversion into the typed
//! model applies the documented defaults and truncates over-length text
//! at a character boundary. Nothing here allocates.
//!
//! The document is comment-tolerant: `//` and `/* */` comments are
//! blanked in place before parsing.

use core::marker::PhantomData;

use heapless::{String, Vec};
use serde::de::{SeqAccess, Visitor};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::limits::LimitComparison;
use super::registers::{ConfigRegister, RegisterCatalog, TelemetryRegister, MAX_REGISTERS};
use super::types::{
    BrokerSettings, Configuration, DeviceSettings, FlowControl, MacAddress, Parity,
    SerialLinkSettings,
};

/// Parse a comment-stripped document
pub fn parse_document(bytes: &[u8]) -> Result<ConfigDocument<'_>, serde_json_core::de::Error> {
    serde_json_core::from_slice(bytes).map(|(document, _)| document)
}

/// Blank comments in place, preserving string literals
///
/// `//` runs to end of line, `/* */` to its terminator. Comment bytes
/// become spaces and newlines stay put, so parser diagnostics keep
/// their original positions. An unterminated block comment blanks to
/// the end of input and the parser reports what remains.
pub fn strip_comments(buffer: &mut [u8]) {
    enum Mode {
        Code,
        Str,
        StrEscape,
        Line,
        Block,
    }

    let mut mode = Mode::Code;
    let mut i = 0;
    while i < buffer.len() {
        match mode {
            Mode::Code => match buffer[i] {
                b'"' => mode = Mode::Str,
                b'/' if buffer.get(i + 1) == Some(&b'/') => {
                    buffer[i] = b' ';
                    mode = Mode::Line;
                }
                b'/' if buffer.get(i + 1) == Some(&b'*') => {
                    // Blank the opener pair at once so `/*/` cannot
                    // terminate itself.
                    buffer[i] = b' ';
                    buffer[i + 1] = b' ';
                    i += 1;
                    mode = Mode::Block;
                }
                _ => {}
            },
            Mode::Str => match buffer[i] {
                b'\\' => mode = Mode::StrEscape,
                b'"' => mode = Mode::Code,
                _ => {}
            },
            Mode::StrEscape => mode = Mode::Str,
            Mode::Line => {
                if buffer[i] == b'\n' {
                    mode = Mode::Code;
                } else {
                    buffer[i] = b' ';
                }
            }
            Mode::Block => {
                if buffer[i] == b'*' && buffer.get(i + 1) == Some(&b'/') {
                    buffer[i] = b' ';
                    buffer[i + 1] = b' ';
                    i += 1;
                    mode = Mode::Code;
                } else if buffer[i] != b'\n' {
                    buffer[i] = b' ';
                }
            }
        }
        i += 1;
    }
}

/// Fixed-capacity list that silently drops entries past `N`
///
/// The register arrays are capacity-bounded: a document with more rows
/// than the catalog holds keeps the first `N` and parses-and-discards
/// the rest.
#[derive(Debug)]
pub struct BoundedList<T, const N: usize>(pub Vec<T, N>);

impl<T, const N: usize> Default for BoundedList<T, N> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<'de, T, const N: usize> Deserialize<'de> for BoundedList<T, N>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SeqVisitor<T, const N: usize>(PhantomData<T>);

        impl<'de, T, const N: usize> Visitor<'de> for SeqVisitor<T, N>
        where
            T: Deserialize<'de>,
        {
            type Value = BoundedList<T, N>;

            fn expecting(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "a sequence of at most {} entries", N)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut list = Vec::new();
                while let Some(entry) = seq.next_element::<T>()? {
                    let _ = list.push(entry);
                }
                Ok(BoundedList(list))
            }
        }

        deserializer.deserialize_seq(SeqVisitor(PhantomData))
    }
}

/// Top-level document; unknown keys are ignored throughout
#[derive(Debug, Default, Deserialize)]
pub struct ConfigDocument<'a> {
    /// `device` section
    #[serde(default, borrow)]
    pub device: Option<DeviceSection<'a>>,
    /// `broker` section
    #[serde(default, borrow)]
    pub broker: Option<BrokerSection<'a>>,
    /// `modbus` section
    #[serde(default, borrow)]
    pub modbus: Option<ModbusSection<'a>>,
}

/// `device` section fields
#[derive(Debug, Default, Deserialize)]
pub struct DeviceSection<'a> {
    #[serde(default, borrow)]
    pub device_name: Option<&'a str>,
    /// Hardware address as colon- or dash-delimited hex text
    #[serde(default, borrow)]
    pub device_mac: Option<&'a str>,
    #[serde(default)]
    pub select_pin: Option<u8>,
}

/// `broker` section fields
#[derive(Debug, Default, Deserialize)]
pub struct BrokerSection<'a> {
    #[serde(default, borrow)]
    pub broker_user: Option<&'a str>,
    #[serde(default, borrow)]
    pub broker_pass: Option<&'a str>,
    #[serde(default, borrow)]
    pub broker_url: Option<&'a str>,
    #[serde(default)]
    pub broker_port: Option<u16>,
    #[serde(default)]
    pub broker_retry_interval_sec: Option<u16>,
}

/// `modbus` section: serial link plus the two register arrays
#[derive(Debug, Default, Deserialize)]
pub struct ModbusSection<'a> {
    #[serde(default, borrow)]
    pub serial_port: Option<SerialPortSection<'a>>,
    #[serde(default, borrow)]
    pub telemetry_registers: BoundedList<TelemetryEntry<'a>, MAX_REGISTERS>,
    #[serde(default, borrow)]
    pub configuration_registers: BoundedList<ConfigRegisterEntry<'a>, MAX_REGISTERS>,
}

/// `modbus.serial_port` fields
#[derive(Debug, Default, Deserialize)]
pub struct SerialPortSection<'a> {
    #[serde(default)]
    pub baud_rate: Option<u32>,
    #[serde(default)]
    pub data_bits: Option<u8>,
    #[serde(default, borrow)]
    pub parity: Option<&'a str>,
    #[serde(default)]
    pub stop_bits: Option<u8>,
    #[serde(default, borrow)]
    pub flow_control: Option<&'a str>,
}

/// One `telemetry_registers[]` entry
#[derive(Debug, Default, Deserialize)]
pub struct TelemetryEntry<'a> {
    #[serde(default, borrow)]
    pub name: Option<&'a str>,
    #[serde(default, borrow)]
    pub units: Option<&'a str>,
    #[serde(default, borrow)]
    pub topic: Option<&'a str>,
    #[serde(default)]
    pub address: Option<u16>,
    #[serde(default)]
    pub value: Option<i32>,
    #[serde(default)]
    pub unit_id: Option<u8>,
}

/// One `configuration_registers[]` entry
#[derive(Debug, Default, Deserialize)]
pub struct ConfigRegisterEntry<'a> {
    #[serde(default, borrow)]
    pub name: Option<&'a str>,
    #[serde(default, borrow)]
    pub units: Option<&'a str>,
    #[serde(default, borrow)]
    pub topic: Option<&'a str>,
    #[serde(default)]
    pub address: Option<u16>,
    #[serde(default)]
    pub value: Option<i32>,
    #[serde(default)]
    pub unit_id: Option<u8>,
    #[serde(default)]
    pub lower_limit: Option<i32>,
    #[serde(default)]
    pub upper_limit: Option<i32>,
    /// Rule name in canonical text form; unrecognized resolves to none
    #[serde(default, borrow)]
    pub limit_comparison: Option<&'a str>,
}

#[derive(Serialize)]
struct ModbusView<'a> {
    serial_port: Option<&'a SerialLinkSettings>,
    telemetry_registers: &'a Vec<TelemetryRegister, MAX_REGISTERS>,
    configuration_registers: &'a Vec<ConfigRegister, MAX_REGISTERS>,
}

// Serialization mirrors the document shape, so a written-out
// configuration parses back through the same path it was loaded by.
impl Serialize for Configuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut document = serializer.serialize_struct("Configuration", 3)?;
        document.serialize_field("device", &self.device)?;
        document.serialize_field("broker", &self.broker)?;
        document.serialize_field(
            "modbus",
            &ModbusView {
                serial_port: self.serial_link.as_ref(),
                telemetry_registers: &self.registers.telemetry,
                configuration_registers: &self.registers.configuration,
            },
        )?;
        document.end()
    }
}

/// Copy text into a bounded string, cutting at a character boundary
fn truncated<const N: usize>(text: &str) -> String<N> {
    let mut out = String::new();
    for ch in text.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

impl DeviceSettings {
    /// Build from the document section, defaulting absent fields
    pub fn from_section(section: Option<&DeviceSection<'_>>) -> Self {
        let mut settings = Self::default();
        let section = match section {
            Some(section) => section,
            None => return settings,
        };
        if let Some(name) = section.device_name {
            settings.name = truncated(name);
        }
        if let Some(text) = section.device_mac {
            // Unreadable MAC text keeps the default address.
            if let Some(mac) = MacAddress::parse(text) {
                settings.mac = mac;
            }
        }
        if let Some(pin) = section.select_pin {
            settings.select_pin = pin;
        }
        settings
    }
}

impl BrokerSettings {
    /// Build from the document section, defaulting absent fields
    pub fn from_section(section: Option<&BrokerSection<'_>>) -> Self {
        let mut settings = Self::default();
        let section = match section {
            Some(section) => section,
            None => return settings,
        };
        if let Some(user) = section.broker_user {
            settings.user = truncated(user);
        }
        if let Some(password) = section.broker_pass {
            settings.password = truncated(password);
        }
        if let Some(url) = section.broker_url {
            settings.url = truncated(url);
        }
        if let Some(port) = section.broker_port {
            settings.port = port;
        }
        if let Some(interval) = section.broker_retry_interval_sec {
            settings.retry_interval_secs = interval;
        }
        settings
    }
}

impl SerialLinkSettings {
    /// Build from the document section, defaulting absent fields
    pub fn from_section(section: &SerialPortSection<'_>) -> Self {
        let mut settings = Self::default();
        if let Some(baud_rate) = section.baud_rate {
            settings.baud_rate = baud_rate;
        }
        if let Some(data_bits) = section.data_bits {
            settings.data_bits = data_bits;
        }
        if let Some(parity) = section.parity {
            settings.parity = Parity::from_text(parity);
        }
        if let Some(stop_bits) = section.stop_bits {
            settings.stop_bits = stop_bits;
        }
        if let Some(flow_control) = section.flow_control {
            settings.flow_control = FlowControl::from_text(flow_control);
        }
        settings
    }
}

impl TelemetryRegister {
    /// Build from a document array entry, defaulting absent fields
    pub fn from_entry(entry: &TelemetryEntry<'_>) -> Self {
        Self {
            name: truncated(entry.name.unwrap_or_default()),
            units: truncated(entry.units.unwrap_or_default()),
            topic: truncated(entry.topic.unwrap_or_default()),
            address: entry.address.unwrap_or_default(),
            value: entry.value.unwrap_or_default(),
            unit_id: entry.unit_id.unwrap_or_default(),
        }
    }
}

impl ConfigRegister {
    /// Build from a document array entry, defaulting absent fields
    pub fn from_entry(entry: &ConfigRegisterEntry<'_>) -> Self {
        Self {
            name: truncated(entry.name.unwrap_or_default()),
            units: truncated(entry.units.unwrap_or_default()),
            topic: truncated(entry.topic.unwrap_or_default()),
            address: entry.address.unwrap_or_default(),
            value: entry.value.unwrap_or_default(),
            unit_id: entry.unit_id.unwrap_or_default(),
            lower_limit: entry.lower_limit.unwrap_or_default(),
            upper_limit: entry.upper_limit.unwrap_or_default(),
            comparison: LimitComparison::from_text(entry.limit_comparison.unwrap_or_default()),
        }
    }
}

impl Configuration {
    /// Build the full model from a parsed document
    ///
    /// Absent sections equal all-default sections. The two register
    /// sequences are filled independently, each capped at its own
    /// capacity. `formed` is left for the loader to set.
    pub fn from_document(document: &ConfigDocument<'_>) -> Self {
        let mut serial_link = None;
        let mut registers = RegisterCatalog::new();
        if let Some(modbus) = &document.modbus {
            serial_link = modbus
                .serial_port
                .as_ref()
                .map(SerialLinkSettings::from_section);
            for entry in &modbus.telemetry_registers.0 {
                registers.push_telemetry(TelemetryRegister::from_entry(entry));
            }
            for entry in &modbus.configuration_registers.0 {
                registers.push_configuration(ConfigRegister::from_entry(entry));
            }
        }
        Self {
            device: DeviceSettings::from_section(document.device.as_ref()),
            broker: BrokerSettings::from_section(document.broker.as_ref()),
            serial_link,
            registers,
            formed: false,
        }
    }
}
