//! Hardware and transport abstraction traits
//!
//! The gateway logic is written against these seams so it runs
//! unchanged on target hardware and in host-side tests.

pub mod net;
pub mod storage;

pub use net::{MessageHandler, NetworkLink, ProtocolClient};
pub use storage::{StorageError, StorageMedium};
