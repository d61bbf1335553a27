//! Configuration data model and loader
//!
//! The document on removable media is parsed into fixed-capacity records
//! with documented defaults. Bounded text is truncated, never rejected;
//! absent fields and sections fall back to defaults.

pub mod document;
pub mod limits;
pub mod loader;
pub mod registers;
pub mod types;

pub use document::*;
pub use limits::*;
pub use loader::*;
pub use registers::*;
pub use types::*;
