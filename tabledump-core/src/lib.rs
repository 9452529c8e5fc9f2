//! Core library for tabledump.
//!
//! Reads every base table of one relational schema (PostgreSQL, MySQL or
//! Redshift) and turns each row into a flat JSON event carrying the table
//! name and a column-to-type schema drawn from a small warehouse type
//! vocabulary. Composite literals (arrays, sets and hstore maps) are
//! rewritten into JSON text on the way.
//!
//! # Security Guarantees
//! - Credentials are zeroized on drop and never logged
//! - Connection URLs are redacted in every log line and error
//! - PostgreSQL and MySQL sessions are opened read-only
//!
//! # Architecture
//! - [`type_mapping`] and [`literal`] are pure functions over strings
//! - [`adapters`] hides each driver behind the [`SourceAdapter`] trait
//! - [`introspect`] and [`extract`] drive any adapter and emit [`Event`]s on
//!   a bounded channel
//!
//! # Example
//! ```rust
//! use tabledump_core::{Dialect, ExtractionConfig};
//!
//! let config = ExtractionConfig::for_dialect(Dialect::PostgreSQL);
//! assert_eq!(config.page_size, Some(10_000));
//!
//! let config = ExtractionConfig::for_dialect(Dialect::Redshift);
//! assert_eq!(config.page_size, None);
//! ```

pub mod adapters;
pub mod dialect;
pub mod error;
pub mod extract;
pub mod introspect;
pub mod literal;
pub mod logging;
pub mod models;
pub mod security;
pub mod type_mapping;

// Re-export commonly used types
pub use adapters::{
    ConnectionConfig, ExtractionConfig, PageRequest, SourceAdapter, create_adapter,
};
pub use dialect::{DEFAULT_PAGE_SIZE, Dialect};
pub use error::{ExtractError, ExtractionAborted, Result};
pub use extract::{
    ExtractionHandle, ExtractionSummary, Extractor, SkipReason, SkippedTable, extract,
    spawn_extraction,
};
pub use logging::init_logging;
pub use models::{
    CellValue, ColumnInfo, CompositeCodec, Event, RawRow, TableLayout, TableSchema,
};
pub use security::Credentials;
pub use type_mapping::{WarehouseType, canonical_type, map_warehouse_type};
