//! Source credentials with automatic memory zeroing.
//!
//! Credentials arrive as a flat key/value map (`adapter`, `host`, `port`,
//! `username`, `password`, `database_name`). The username and password are
//! held in `Zeroizing` containers and cleared when the value is dropped.

use crate::adapters::ConnectionConfig;
use crate::dialect::Dialect;
use crate::{Result, error::ExtractError};
use std::collections::HashMap;
use url::Url;
use zeroize::{Zeroize, Zeroizing};

/// Secure credential container that automatically zeros memory on drop.
///
/// # Example
///
/// ```rust
/// use tabledump_core::Dialect;
/// use tabledump_core::security::Credentials;
///
/// let creds = Credentials::new("2", "db.internal", "shop", "reader")
///     .with_password("secret");
/// assert_eq!(creds.dialect().unwrap(), Dialect::PostgreSQL);
/// assert!(creds.has_password());
/// assert!(!format!("{:?}", creds).contains("secret"));
/// ```
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct Credentials {
    /// Numeric adapter code (`0` MySQL, `2` PostgreSQL, `3` Redshift)
    pub adapter: String,
    /// Server host name or address
    pub host: String,
    /// Explicit port; the dialect default applies when absent
    pub port: Option<u16>,
    /// Database to connect to
    pub database_name: String,
    /// Login user
    pub username: Zeroizing<String>,
    /// Login password, if any
    pub password: Zeroizing<Option<String>>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("adapter", &self.adapter)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_name", &self.database_name)
            .field("has_password", &self.has_password())
            .finish_non_exhaustive()
    }
}

fn required<'a>(map: &'a HashMap<String, String>, key: &str) -> Result<&'a str> {
    match map.get(key).map(|v| v.trim()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ExtractError::configuration(format!(
            "missing credential field '{}'",
            key
        ))),
    }
}

impl Credentials {
    /// Creates credentials without a password.
    pub fn new(
        adapter: impl Into<String>,
        host: impl Into<String>,
        database_name: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            adapter: adapter.into(),
            host: host.into(),
            port: None,
            database_name: database_name.into(),
            username: Zeroizing::new(username.into()),
            password: Zeroizing::new(None),
        }
    }

    /// Builder method to set the password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Zeroizing::new(Some(password.into()));
        self
    }

    /// Builder method to set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Reads credentials from a key/value map.
    ///
    /// `adapter`, `host`, `database_name` and `username` are required;
    /// `password` and `port` are optional. The adapter code is validated here
    /// so an unknown dialect fails before any connection attempt.
    ///
    /// # Errors
    /// Returns a configuration error for missing fields, an unknown adapter
    /// code or a port outside `1..=65535`.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self> {
        let adapter = required(map, "adapter")?;
        Dialect::from_adapter_code(adapter)?;

        let mut creds = Self::new(
            adapter,
            required(map, "host")?,
            required(map, "database_name")?,
            required(map, "username")?,
        );

        if let Some(port) = map.get("port").map(|p| p.trim()).filter(|p| !p.is_empty()) {
            let port = port
                .parse::<u16>()
                .ok()
                .filter(|p| *p > 0)
                .ok_or_else(|| {
                    ExtractError::configuration(format!("invalid port '{}'", port))
                })?;
            creds = creds.with_port(port);
        }

        if let Some(password) = map.get("password").filter(|p| !p.is_empty()) {
            creds = creds.with_password(password.as_str());
        }

        Ok(creds)
    }

    /// Gets the username (still protected by Zeroizing).
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Checks if password is present without exposing it.
    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    /// Dialect selected by the adapter code.
    pub fn dialect(&self) -> Result<Dialect> {
        Dialect::from_adapter_code(&self.adapter)
    }

    /// Port to connect to, falling back to the dialect default.
    pub fn effective_port(&self) -> Result<u16> {
        Ok(self.port.unwrap_or(self.dialect()?.default_port()))
    }

    /// Builds the driver connection URL.
    ///
    /// Username, password and database name are percent-encoded. The result
    /// contains the password and is zeroed on drop; log it only through
    /// [`redact_database_url`](crate::error::redact_database_url).
    ///
    /// # Errors
    /// Returns a configuration error if the host cannot form a valid URL.
    pub fn connection_url(&self) -> Result<Zeroizing<String>> {
        let dialect = self.dialect()?;
        let invalid = || {
            ExtractError::configuration(format!(
                "cannot build a {} connection URL for host '{}'",
                dialect, self.host
            ))
        };

        if self.host.trim().is_empty() {
            return Err(invalid());
        }
        let mut url = Url::parse(&format!("{}://{}", dialect.url_scheme(), self.host.trim()))
            .map_err(|_| invalid())?;
        if url.host_str().is_none_or(str::is_empty) {
            return Err(invalid());
        }
        url.set_port(Some(self.effective_port()?))
            .map_err(|_| invalid())?;
        url.set_username(self.username()).map_err(|_| invalid())?;
        if let Some(password) = self.password.as_deref() {
            url.set_password(Some(password)).map_err(|_| invalid())?;
        }
        url.set_path(&self.database_name);

        Ok(Zeroizing::new(url.to_string()))
    }

    /// Secret-free connection settings for this source.
    pub fn connection_config(&self) -> Result<ConnectionConfig> {
        Ok(
            ConnectionConfig::for_dialect(self.dialect()?, self.host.trim(), &self.database_name)
                .with_port(self.effective_port()?),
        )
    }
}
