//! PostgreSQL and Redshift source adapter.
//!
//! Redshift speaks the PostgreSQL wire protocol, so both dialects share this
//! adapter; the [`Dialect`] it was created for decides quoting, paging and
//! whether `udt_name` is queried.
//!
//! # Module Structure
//! - `connection`: Connection pool management and validation
//! - `introspection`: Tables, columns, primary keys and row counts
//!
//! # Security Guarantees
//! - All operations are read-only (SELECT only)
//! - Connection strings are sanitized in error messages
//! - PostgreSQL sessions are opened with `default_transaction_read_only`

mod connection;
mod introspection;


use super::{ConnectionConfig, PageRequest, SourceAdapter, helpers};
use crate::dialect::Dialect;
use crate::error::ExtractError;
use crate::models::{ColumnInfo, RawRow};
use crate::Result;
use async_trait::async_trait;
use sqlx::PgPool;

/// PostgreSQL-family adapter over a single-connection pool
pub struct PostgresAdapter {
    pub pool: PgPool,
    pub config: ConnectionConfig,
}

impl std::fmt::Debug for PostgresAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresAdapter")
            .field("config", &self.config)
            .field("pool_size", &self.pool.size())
            .field("pool_idle", &self.pool.num_idle())
            .finish()
    }
}

#[async_trait]
impl SourceAdapter for PostgresAdapter {
    fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    async fn test_connection(&self) -> Result<()> {
        let connectivity_result: i32 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                ExtractError::connection_failed(format!("Failed to ping {}", self.config), e)
            })?;

        if connectivity_result != 1 {
            return Err(ExtractError::configuration(
                "Basic connectivity test failed: unexpected result",
            ));
        }

        Ok(())
    }

    async fn list_tables(&self, schema: &str) -> Result<Vec<String>> {
        introspection::list_tables(self, schema).await
    }

    async fn table_columns(&self, schema: &str, table: &str) -> Result<Vec<ColumnInfo>> {
        introspection::table_columns(self, schema, table).await
    }

    async fn count_rows(&self, schema: &str, table: &str) -> Result<u64> {
        introspection::count_rows(self, schema, table).await
    }

    async fn primary_key_columns(&self, schema: &str, table: &str) -> Result<Vec<String>> {
        introspection::primary_key_columns(self, schema, table).await
    }

    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Vec<RawRow>> {
        let sql = request.to_sql(self.config.dialect);
        tracing::debug!("Fetching page {} of {}: {}", request.page, request.table, sql);

        // The simple query protocol returns every value as text
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
