//! PostgreSQL connection pool management and validation.
//!
//! # Security Features
//! - Validates connection string format before connecting
//! - Caps the pool at the configured size (one connection by default)
//! - Opens sessions read-only when the config asks for it

use super::{ConnectionConfig, PostgresAdapter};
use crate::adapters::{SourceAdapter, ensure_dialect};
use crate::dialect::Dialect;
use crate::error::{ExtractError, redact_database_url};
use crate::security::Credentials;
use crate::Result;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use std::str::FromStr;
use url::Url;

/// Application name reported to the server.
const APPLICATION_NAME: &str = concat!("tabledump-", env!("CARGO_PKG_VERSION"));

impl PostgresAdapter {
    /// Connects to the PostgreSQL or Redshift source described by
    /// `credentials` and pings it.
    ///
    /// # Errors
    /// Returns error if:
    /// - The credentials select another dialect
    /// - The connection URL cannot be built
    /// - The source cannot be reached
    pub async fn connect(credentials: &Credentials) -> Result<Self> {
        ensure_dialect(
            credentials,
            &[Dialect::PostgreSQL, Dialect::Redshift],
            "PostgreSQL",
        )?;
        let config = credentials.connection_config()?;
        let url = credentials.connection_url()?;
        Self::with_config(&url, config).await
    }

    /// Creates an adapter from a connection URL and custom configuration.
    ///
    /// # Arguments
    /// * `connection_string` - PostgreSQL connection URL (sanitized in errors)
    /// * `config` - Connection configuration for `PostgreSQL` or `Redshift`
    pub async fn with_config(connection_string: &str, config: ConnectionConfig) -> Result<Self> {
        if config.dialect == Dialect::MySQL {
            return Err(ExtractError::configuration(
                "PostgreSQL adapter cannot serve MySQL sources",
            ));
        }
        config.validate()?;
        Self::validate_connection_string(connection_string)?;

        let pool = Self::create_connection_pool(connection_string, &config)?;
        let adapter = Self { pool, config };

        adapter.test_connection().await?;
        tracing::info!(
            "Connected to {} ({})",
            adapter.config,
            redact_database_url(connection_string)
        );
        Ok(adapter)
    }

    /// Creates the connection pool.
    ///
    /// The pool connects lazily; the first query (the ping in
    /// [`with_config`](Self::with_config)) opens the connection.
    pub(crate) fn create_connection_pool(
        connection_string: &str,
        config: &ConnectionConfig,
    ) -> Result<PgPool> {
        use sqlx::Executor;

        let options = PgConnectOptions::from_str(connection_string)
            .map_err(|e| {
                ExtractError::connection_failed(
                    format!(
                        "Invalid PostgreSQL connection options for {}",
                        redact_database_url(connection_string)
                    ),
                    e,
                )
            })?
            .application_name(APPLICATION_NAME);

        let read_only = config.read_only;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    if read_only {
                        conn.execute("SET default_transaction_read_only = on")
                            .await?;
                    }
                    Ok(())
                })
            })
            .connect_lazy_with(options);

        Ok(pool)
    }

    /// Validates connection string format.
    ///
    /// # Errors
    /// Returns error if the URL is malformed, uses another scheme, or has no host
    pub fn validate_connection_string(connection_string: &str) -> Result<()> {
        let url = Url::parse(connection_string).map_err(|e| {
            ExtractError::configuration(format!(
                "Invalid PostgreSQL connection string format: {}",
                e
            ))
        })?;

        if !matches!(url.scheme(), "postgres" | "postgresql") {
            return Err(ExtractError::configuration(
                "Connection string must use postgres:// or postgresql:// scheme",
            ));
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(ExtractError::configuration(
                "Connection string must specify a host",
            ));
        }

        Ok(())
    }
}
