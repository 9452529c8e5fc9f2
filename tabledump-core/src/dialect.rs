//! Source dialect descriptors.
//!
//! A [`Dialect`] is selected once from the credential's adapter code and
//! carries everything that differs between source families: identifier
//! quoting, page size, the schema-name rule and bind placeholder syntax.

use crate::{Result, error::ExtractError};
use serde::{Deserialize, Serialize};

/// Rows per page for paginating dialects.
pub const DEFAULT_PAGE_SIZE: u32 = 10_000;

/// Supported source dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// PostgreSQL, paginated by primary key
    PostgreSQL,
    /// MySQL, paginated by primary key, backtick identifiers
    MySQL,
    /// Amazon Redshift, read in a single unbounded page
    Redshift,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::PostgreSQL => write!(f, "PostgreSQL"),
            Dialect::MySQL => write!(f, "MySQL"),
            Dialect::Redshift => write!(f, "Redshift"),
        }
    }
}

impl Dialect {
    /// Resolves the numeric adapter code used in credential maps.
    ///
    /// `0` is MySQL, `2` is PostgreSQL (unicode) and `3` is Redshift.
    ///
    /// # Errors
    /// Returns a configuration error for any other code.
    pub fn from_adapter_code(code: &str) -> Result<Self> {
        match code.trim() {
            "0" => Ok(Dialect::MySQL),
            "2" => Ok(Dialect::PostgreSQL),
            "3" => Ok(Dialect::Redshift),
            other => Err(ExtractError::configuration(format!(
                "unknown adapter code '{}' (expected 0=mysql, 2=postgresql, 3=redshift)",
                other
            ))),
        }
    }

    /// Character used to delimit identifiers.
    pub fn quote_char(self) -> char {
        match self {
            Dialect::MySQL => '`',
            Dialect::PostgreSQL | Dialect::Redshift => '"',
        }
    }

    /// Quotes an identifier, doubling any embedded quote character.
    pub fn quote_identifier(self, identifier: &str) -> String {
        let quote = self.quote_char();
        let mut quoted = String::with_capacity(identifier.len() + 2);
        quoted.push(quote);
        for c in identifier.chars() {
            if c == quote {
                quoted.push(quote);
            }
            quoted.push(c);
        }
        quoted.push(quote);
        quoted
    }

    /// Page size, or `None` when the dialect reads whole tables at once.
    pub fn page_size(self) -> Option<u32> {
        match self {
            Dialect::PostgreSQL | Dialect::MySQL => Some(DEFAULT_PAGE_SIZE),
            Dialect::Redshift => None,
        }
    }

    /// Whether extraction uses ordered LIMIT/OFFSET pages.
    pub fn paginates(self) -> bool {
        self.page_size().is_some()
    }

    /// Schema to introspect: the database itself for MySQL, `public` otherwise.
    pub fn schema_name(self, database_name: &str) -> String {
        match self {
            Dialect::MySQL => database_name.to_string(),
            Dialect::PostgreSQL | Dialect::Redshift => "public".to_string(),
        }
    }

    /// Whether `information_schema.columns` is asked for `udt_name`.
    pub fn reports_user_defined_type(self) -> bool {
        matches!(self, Dialect::PostgreSQL)
    }

    /// Bind placeholder for the `n`-th (1-based) query parameter.
    pub fn placeholder(self, n: usize) -> String {
        match self {
            Dialect::MySQL => "?".to_string(),
            Dialect::PostgreSQL | Dialect::Redshift => format!("${}", n),
        }
    }

    /// URL scheme understood by the sqlx driver for this dialect.
    pub fn url_scheme(self) -> &'static str {
        match self {
            Dialect::MySQL => "mysql",
            Dialect::PostgreSQL | Dialect::Redshift => "postgres",
        }
    }

    /// Default server port.
    pub fn default_port(self) -> u16 {
        match self {
            Dialect::MySQL => 3306,
            Dialect::PostgreSQL => 5432,
            Dialect::Redshift => 5439,
        }
    }
}
