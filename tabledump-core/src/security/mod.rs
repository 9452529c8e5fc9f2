//! Credential handling for source connections.
//!
//! # Security Guarantees
//! - Username and password are stored in `Zeroizing` containers
//! - `Debug` output never includes the username or password
//! - Connection URLs are only logged through
//!   [`redact_database_url`](crate::error::redact_database_url)

mod credentials;

pub use credentials::Credentials;
