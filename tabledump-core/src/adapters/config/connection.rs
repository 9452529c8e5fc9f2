//! Source connection settings.

use crate::dialect::Dialect;
use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Secret-free settings for one source connection.
///
/// Credentials stay in [`Credentials`](crate::security::Credentials); this
/// struct is safe to log and serialize.
///
/// # Example
/// ```rust
/// use tabledump_core::{ConnectionConfig, Dialect};
///
/// let config = ConnectionConfig::for_dialect(Dialect::Redshift, "cluster.local", "dev");
/// assert_eq!(config.port, 5439);
/// assert!(!config.read_only);
/// assert_eq!(config.to_string(), "Redshift source cluster.local:5439/dev");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Source dialect
    pub dialect: Dialect,
    /// Server host name or address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database to connect to
    pub database: String,
    /// How long to wait for the pooled connection
    pub acquire_timeout: Duration,
    /// Pool size; extraction uses one connection serially
    pub max_connections: u32,
    /// Open sessions with a read-only transaction default
    pub read_only: bool,
}

impl ConnectionConfig {
    /// Settings for `dialect` with its default port.
    ///
    /// PostgreSQL and MySQL sessions are read-only; Redshift sessions keep
    /// the server defaults.
    pub fn for_dialect(dialect: Dialect, host: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            dialect,
            host: host.into(),
            port: dialect.default_port(),
            database: database.into(),
            acquire_timeout: Duration::from_secs(30),
            max_connections: 1,
            read_only: dialect != Dialect::Redshift,
        }
    }

    /// Builder method to set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Builder method to set the acquire timeout.
    pub fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Checks the settings before a pool is built.
    ///
    /// # Errors
    /// Returns a configuration error for an empty host, port zero, an empty
    /// pool or a zero timeout
    pub fn validate(&self) -> crate::Result<()> {
        let problem = if self.host.trim().is_empty() {
            "host cannot be empty"
        } else if self.port == 0 {
            "port must be greater than 0"
        } else if self.max_connections == 0 {
            "max_connections must be greater than 0"
        } else if self.acquire_timeout.is_zero() {
            "acquire_timeout must be greater than 0"
        } else {
            return Ok(());
        };
        Err(ExtractError::configuration(format!(
            "{} connection: {}",
            self.dialect, problem
        )))
    }
}

impl std::fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} source {}:{}/{}",
            self.dialect, self.host, self.port, self.database
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_defaults() {
        let pg = ConnectionConfig::for_dialect(Dialect::PostgreSQL, "db", "app");
        assert_eq!(pg.port, 5432);
        assert_eq!(pg.max_connections, 1);
        assert!(pg.read_only);

        let mysql = ConnectionConfig::for_dialect(Dialect::MySQL, "db", "shop").with_port(3307);
        assert_eq!(mysql.port, 3307);
        assert!(mysql.read_only);

        assert!(!ConnectionConfig::for_dialect(Dialect::Redshift, "db", "dev").read_only);
    }

    #[test]
    fn test_validation_names_the_problem() {
        let config = ConnectionConfig::for_dialect(Dialect::MySQL, "localhost", "shop");
        assert!(config.validate().is_ok());

        let err = ConnectionConfig::for_dialect(Dialect::MySQL, " ", "shop")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("MySQL connection: host cannot be empty"));

        let err = config.clone().with_port(0).validate().unwrap_err();
        assert!(err.to_string().contains("port"));

        let err = config
            .with_acquire_timeout(Duration::ZERO)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("acquire_timeout"));
    }
}
