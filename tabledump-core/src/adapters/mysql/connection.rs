//! MySQL connection pool management and validation.
//!
//! # Security Features
//! - Validates connection string format before connecting
//! - Caps the pool at the configured size (one connection by default)
//! - Opens sessions read-only when the config asks for it

use super::{ConnectionConfig, MySqlAdapter};
use crate::Result;
use crate::adapters::{SourceAdapter, ensure_dialect};
use crate::dialect::Dialect;
use crate::error::{ExtractError, redact_database_url};
use crate::security::Credentials;
use sqlx::MySqlPool;
use url::Url;

impl MySqlAdapter {
    /// Connects to the MySQL source described by `credentials` and pings it.
    ///
    /// # Errors
    /// Returns error if:
    /// - The credentials select another dialect
    /// - The connection URL cannot be built
    /// - The source cannot be reached
    pub async fn connect(credentials: &Credentials) -> Result<Self> {
        ensure_dialect(credentials, &[Dialect::MySQL], "MySQL")?;
        let config = credentials.connection_config()?;
        let url = credentials.connection_url()?;
        Self::with_config(&url, config).await
    }

    /// Creates an adapter from a connection URL and custom configuration.
    ///
    /// # Arguments
    /// * `connection_string` - MySQL connection URL (sanitized in errors)
    /// * `config` - Connection configuration
    pub async fn with_config(connection_string: &str, config: ConnectionConfig) -> Result<Self> {
        if config.dialect != Dialect::MySQL {
            return Err(ExtractError::configuration(format!(
                "MySQL adapter cannot serve {} sources",
                config.dialect
            )));
        }
        config.validate()?;
        validate_mysql_connection_string(connection_string)?;

        let pool = create_mysql_connection_pool(connection_string, &config)?;
        let adapter = Self { pool, config };

        adapter.test_connection().await?;
        tracing::info!(
            "Connected to {} ({})",
            adapter.config,
            redact_database_url(connection_string)
        );
        Ok(adapter)
    }
}

/// Validates MySQL connection string format.
///
/// # Errors
/// Returns error if the URL is malformed, uses another scheme, or has no host
pub(crate) fn validate_mysql_connection_string(connection_string: &str) -> Result<()> {
    let url = Url::parse(connection_string).map_err(|e| {
        ExtractError::configuration(format!("Invalid MySQL connection string format: {}", e))
    })?;

    if url.scheme() != "mysql" {
        return Err(ExtractError::configuration(
            "Connection string must use mysql:// scheme",
        ));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(ExtractError::configuration(
            "Connection string must specify a host",
        ));
    }

    Ok(())
}

/// Creates the connection pool; the first query opens the connection.
pub(crate) fn create_mysql_connection_pool(
    connection_string: &str,
    config: &ConnectionConfig,
) -> Result<MySqlPool> {
    use sqlx::Executor;

    let read_only = config.read_only;

    let pool = sqlx::mysql::MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                if read_only {
                    conn.execute("SET SESSION TRANSACTION READ ONLY").await?;
                }
                Ok(())
            })
        })
        .connect_lazy(connection_string)
        .map_err(|e| {
            ExtractError::connection_failed(
                format!(
                    "Failed to create MySQL connection pool to {}",
                    redact_database_url(connection_string)
                ),
                e,
            )
        })?;

    Ok(pool)
}
