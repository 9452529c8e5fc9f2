//! MySQL source adapter.
//!
//! # Module Structure
//! - `connection`: Connection pool management and validation
//! - `introspection`: Tables, columns, primary keys and row counts
//!
//! # Security Guarantees
//! - All operations are read-only (SELECT only)
//! - Connection strings are sanitized in error messages
//! - Sessions are opened with `TRANSACTION READ ONLY`

mod connection;
mod introspection;


use super::{ConnectionConfig, PageRequest, SourceAdapter, helpers};
use crate::Result;
use crate::dialect::Dialect;
use crate::error::ExtractError;
use crate::models::{ColumnInfo, RawRow};
use async_trait::async_trait;
use sqlx::MySqlPool;

/// MySQL adapter over a single-connection pool
pub struct MySqlAdapter {
    /// Connection pool for database operations
    pub pool: MySqlPool,
    /// Connection configuration (no credentials)
    pub config: ConnectionConfig,
}

impl std::fmt::Debug for MySqlAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlAdapter")
            .field("config", &self.config)
            .field("pool_size", &self.pool.size())
            .field("pool_idle", &self.pool.num_idle())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SourceAdapter for MySqlAdapter {
    fn dialect(&self) -> Dialect {
        Dialect::MySQL
    }

    async fn test_connection(&self) -> Result<()> {
        let connectivity_result: i32 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ExtractError::connection_failed("Failed to ping MySQL source", e))?;

        if connectivity_result != 1 {
            return Err(ExtractError::configuration(
                "Basic connectivity test failed: unexpected result",
            ));
        }

        Ok(())
    }

    async fn list_tables(&self, schema: &str) -> Result<Vec<String>> {
        introspection::list_tables(&self.pool, schema).await
    }

    async fn table_columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnInfo>> {
        introspection::table_columns(&self.pool, schema, table).await
    }

    async fn count_rows(&self, schema: &str, table: &str) -> Result<u64> {
        introspection::count_rows(&self.pool, schema, table).await
    }

    async fn primary_key_columns(&self, schema: &str, table: &str) -> Result<Vec<String>> {
        introspection::primary_key_columns(&self.pool, schema, table).await
    }

    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Vec<RawRow>> {
        let sql = request.to_sql(Dialect::MySQL);
        tracing::debug!("Fetching page {} of {}: {}", request.page, request.table, sql);

        // COM_QUERY returns every value in text form
        let rows = sqlx::raw_sql(&sql).fetch_all(&self.pool).await.map_err(|e| {
            ExtractError::extraction_failed(
                format!(
                    "Failed to fetch page {} of table '{}.{}'",
                    request.page, request.schema, request.table
                ),
                e,
            )
        })?;

        rows.iter()
            .map(|row| helpers::decode_row(row, request.table))
            .collect()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
