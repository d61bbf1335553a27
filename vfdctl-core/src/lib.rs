//! Board-agnostic core logic for the vfdctl gateway firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware or transport implementations:
//!
//! - Configuration data model with fixed-capacity fields
//! - Document parsing and the loader that populates the model
//! - Register catalog and topic-prefix lookup
//! - Broker connection lifecycle manager
//! - Collaborator traits (storage medium, network link, protocol client)

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

pub mod config;
pub mod traits;
pub mod uplink;
