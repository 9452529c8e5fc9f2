//! Source adapter trait and factory for unified table access.
//!
//! An adapter owns one connection pool bound to one [`Dialect`] and answers
//! the handful of questions extraction needs: which tables exist, what their
//! columns and primary keys are, how many rows they hold, and what one page
//! of rows contains.
//!
//! # Module Structure
//! - `config`: Configuration types (ConnectionConfig, ExtractionConfig)
//! - `helpers`: Row decoding shared by the sqlx-backed adapters
//! - `query`: SQL text for introspection and pages
//! - Dialect-specific modules (postgres, mysql)

use crate::dialect::Dialect;
use crate::models::{ColumnInfo, RawRow};
use crate::security::Credentials;
use crate::{Result, error::ExtractError};
use async_trait::async_trait;

pub mod config;
pub mod helpers;
pub mod query;

#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "postgresql")]
pub mod postgres;

pub use config::{ConnectionConfig, DEFAULT_CHANNEL_CAPACITY, ExtractionConfig};

/// One page of rows to fetch from a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest<'a> {
    /// Schema holding the table
    pub schema: &'a str,
    /// Table to read
    pub table: &'a str,
    /// Columns to select, in ordinal order
    pub columns: Vec<&'a str>,
    /// Ordering key; empty when the dialect does not paginate
    pub primary_key: &'a [String],
    /// Rows per page, `None` for a single unbounded page
    pub page_size: Option<u32>,
    /// Zero-based page index
    pub page: u64,
}

impl PageRequest<'_> {
    /// Row offset of this page.
    pub fn offset(&self) -> u64 {
        self.page_size.map_or(0, |size| u64::from(size) * self.page)
    }

    /// SQL text of this page for a dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        query::page_sql(
            dialect,
            self.schema,
            self.table,
            &self.columns,
            self.primary_key,
            self.page_size,
            self.page,
        )
    }
}

/// Main trait for source adapters with object-safe design.
///
/// # Security Guarantees
/// - All operations are read-only (SELECT only)
/// - Credentials are never stored or logged
/// - Connection strings are sanitized in error messages
///
/// # Object Safety
/// This trait is object-safe, allowing for dynamic dispatch through
/// `Box<dyn SourceAdapter>` or `Arc<dyn SourceAdapter>`.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Dialect of the connected source.
    fn dialect(&self) -> Dialect;

    /// Pings the source.
    ///
    /// # Errors
    /// Returns a connection error if the source cannot be reached
    async fn test_connection(&self) -> Result<()>;

    /// Names of the base tables in `schema`, ordered by name.
    async fn list_tables(&self, schema: &str) -> Result<Vec<String>>;

    /// Reported column metadata of one table in ordinal order.
    async fn table_columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnInfo>>;

    /// Exact row count of one table.
    async fn count_rows(&self, schema: &str, table: &str) -> Result<u64>;

    /// Primary-key columns in key order; empty when the table has none.
    async fn primary_key_columns(&self, schema: &str, table: &str) -> Result<Vec<String>>;

    /// Fetches one page of decoded rows in query order.
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Vec<RawRow>>;

    /// Releases the connection pool.
    async fn close(&self) {}
}

/// Factory function to create a connected, pinged adapter from credentials.
///
/// # Security
/// - The connection URL is built from `credentials` and never logged unredacted
/// - Sessions are read-only where the source supports it
///
/// # Errors
/// Returns error if:
/// - The adapter code is unknown
/// - Required features are not compiled in
/// - The source cannot be reached
pub async fn create_adapter(credentials: &Credentials) -> Result<Box<dyn SourceAdapter>> {
    match credentials.dialect()? {
        #[cfg(feature = "postgresql")]
        Dialect::PostgreSQL | Dialect::Redshift => {
            let adapter = postgres::PostgresAdapter::connect(credentials).await?;
            Ok(Box::new(adapter))
        }
        #[cfg(not(feature = "postgresql"))]
        dialect @ (Dialect::PostgreSQL | Dialect::Redshift) => Err(
            ExtractError::unsupported_feature(
                "Extraction (compile with --features postgresql)",
                dialect.to_string(),
            ),
        ),
        #[cfg(feature = "mysql")]
        Dialect::MySQL => {
            let adapter = mysql::MySqlAdapter::connect(credentials).await?;
            Ok(Box::new(adapter))
        }
        #[cfg(not(feature = "mysql"))]
        Dialect::MySQL => Err(ExtractError::unsupported_feature(
            "Extraction (compile with --features mysql)",
            Dialect::MySQL.to_string(),
        )),
    }
}

/// Rejects credentials whose dialect another adapter handles.
#[cfg_attr(not(any(feature = "postgresql", feature = "mysql")), allow(dead_code))]
pub(crate) fn ensure_dialect(
    credentials: &Credentials,
    accepted: &[Dialect],
    adapter: &str,
) -> Result<Dialect> {
    let dialect = credentials.dialect()?;
    if accepted.contains(&dialect) {
        Ok(dialect)
    } else {
        Err(ExtractError::configuration(format!(
            "{} adapter cannot serve {} sources",
            adapter, dialect
        )))
    }
}
