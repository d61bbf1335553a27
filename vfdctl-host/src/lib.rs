//! Host-side rig for the vfdctl gateway core
//!
//! Everything the core treats as a collaborator, backed by the host
//! OS: a directory standing in for the removable media volume, and an
//! in-process broker simulation for driving the connection manager
//! through its states without a network.

pub mod sim;
pub mod storage;
