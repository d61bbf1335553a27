//! Register descriptors and the catalog
//!
//! Two fixed-capacity sequences in document order: telemetry registers
//! are read and published outward; configuration registers are settable
//! from the command namespace, bounded by limits. Entries past capacity
//! are dropped at load time.

use heapless::{String, Vec};
use serde::Serialize;

use super::limits::LimitComparison;

/// Maximum register name length
pub const MAX_REGISTER_NAME_LEN: usize = 32;

/// Maximum units label length
pub const MAX_UNITS_LEN: usize = 16;

/// Maximum topic length
pub const MAX_TOPIC_LEN: usize = 32;

/// Capacity of each catalog sequence
pub const MAX_REGISTERS: usize = 50;

/// A fieldbus data point that is read and published outward
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TelemetryRegister {
    /// Human-readable point name
    pub name: String<MAX_REGISTER_NAME_LEN>,
    /// Engineering units label
    pub units: String<MAX_UNITS_LEN>,
    /// Topic the value is published under
    pub topic: String<MAX_TOPIC_LEN>,
    /// Register address on the device
    pub address: u16,
    /// Last known value
    pub value: i32,
    /// Fieldbus unit identifier
    pub unit_id: u8,
}

/// A bounded, externally settable control point
///
/// Looked up by topic prefix when a command arrives; the limit rule
/// decides whether the commanded value is applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigRegister {
    /// Human-readable point name
    pub name: String<MAX_REGISTER_NAME_LEN>,
    /// Engineering units label
    pub units: String<MAX_UNITS_LEN>,
    /// Topic commands for this register arrive under
    pub topic: String<MAX_TOPIC_LEN>,
    /// Register address on the device
    pub address: u16,
    /// Last known value
    pub value: i32,
    /// Fieldbus unit identifier
    pub unit_id: u8,
    /// Lower bound for inbound writes
    pub lower_limit: i32,
    /// Upper bound for inbound writes
    pub upper_limit: i32,
    /// Rule applied to inbound writes
    #[serde(rename = "limit_comparison")]
    pub comparison: LimitComparison,
}

impl ConfigRegister {
    /// Check an inbound value against this register's bounds
    pub fn accepts(&self, value: i32) -> bool {
        self.comparison
            .permits(value, self.lower_limit, self.upper_limit)
    }
}

/// Register catalog
///
/// Indices are stable once loaded. Duplicate topics are not rejected;
/// lookups return the first match in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterCatalog {
    /// Telemetry registers, document order
    pub telemetry: Vec<TelemetryRegister, MAX_REGISTERS>,
    /// Configuration registers, document order
    pub configuration: Vec<ConfigRegister, MAX_REGISTERS>,
}

impl RegisterCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a telemetry register, dropping it if the catalog is full
    pub fn push_telemetry(&mut self, register: TelemetryRegister) {
        let _ = self.telemetry.push(register);
    }

    /// Append a configuration register, dropping it if the catalog is full
    pub fn push_configuration(&mut self, register: ConfigRegister) {
        let _ = self.configuration.push(register);
    }

    /// Find the configuration register covering a command topic
    ///
    /// Scans in document order and returns the first register whose
    /// topic is a prefix of `topic`, so a register at `cmd/vfdctl/freq`
    /// also covers `cmd/vfdctl/freq/set`. No match is `None`.
    pub fn find_config_register(&self, topic: &str) -> Option<&ConfigRegister> {
        self.configuration
            .iter()
            .find(|register| topic.starts_with(register.topic.as_str()))
    }
}
