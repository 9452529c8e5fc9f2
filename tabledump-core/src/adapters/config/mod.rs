//! Configuration types for source adapters and extraction runs.
//!
//! - `ConnectionConfig`: connection settings
//! - `ExtractionConfig`: paging and event channel settings
//!
//! # Security
//! These configuration structs intentionally do NOT store passwords or credentials.
//! Credentials must be handled separately through the security module.

mod connection;
mod extraction;

pub use connection::ConnectionConfig;
pub use extraction::{DEFAULT_CHANNEL_CAPACITY, ExtractionConfig};
