//! Library module for the tabledump binary.
//!
//! Holds the command-line surface and the NDJSON sink so they can be tested
//! without spawning the binary. The entry point is in main.rs.

pub mod output;

use clap::{Args, Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;
use tabledump_core::adapters::DEFAULT_CHANNEL_CAPACITY;
use tabledump_core::{Credentials, Dialect, ExtractError, ExtractionConfig};
use zeroize::Zeroizing;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "tabledump")]
#[command(about = "Relational table extraction to warehouse-typed JSON events")]
#[command(version)]
#[command(long_about = "
tabledump - Relational table extraction

Reads every base table of one schema and writes each row as a JSON object,
one per line, carrying the table name (_table_name) and a column-to-warehouse
type map (_table_schema). Array, set and hstore values are re-encoded as JSON
text.

ADAPTER CODES:
  0  MySQL       (schema = database name, paginated by primary key)
  2  PostgreSQL  (schema = public, paginated by primary key)
  3  Redshift    (schema = public, one page per table)

SECURITY FEATURES:
- Sessions are opened read-only where the source supports it
- Passwords are never logged and are zeroed after use
- Connection URLs are redacted in all diagnostics

EXAMPLES:
  tabledump --adapter 2 --host localhost --database shop --username etl --prompt-password
  TABLEDUMP_PASSWORD=secret tabledump --adapter 0 --host db --database shop --username etl -o rows.ndjson
  tabledump --adapter 3 --host cluster.example.com --database dev --username etl test
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Output file path
    #[arg(
        short,
        long,
        help = "Write NDJSON events to this file instead of stdout"
    )]
    pub output: Option<PathBuf>,

    /// Rows per page
    #[arg(
        long,
        env = "TABLEDUMP_PAGE_SIZE",
        help = "Rows per page for paginating sources (ignored for Redshift)"
    )]
    pub page_size: Option<u32>,

    /// Event buffer size
    #[arg(
        long,
        default_value_t = DEFAULT_CHANNEL_CAPACITY,
        help = "Number of events buffered between extraction and output"
    )]
    pub channel_capacity: usize,
}

/// Operation to run.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Extract every table (default)
    Extract,
    /// Test the source connection
    Test,
    /// List supported source dialects
    List,
}

/// Source connection arguments.
///
/// All fields are optional at parse time so `list` works without them;
/// [`SourceArgs::credentials`] reports what is missing.
#[derive(Args, Clone, Default)]
pub struct SourceArgs {
    /// Adapter code
    #[arg(long, env = "TABLEDUMP_ADAPTER", help = "Adapter code: 0 MySQL, 2 PostgreSQL, 3 Redshift")]
    pub adapter: Option<String>,

    /// Source host
    #[arg(long, env = "TABLEDUMP_HOST")]
    pub host: Option<String>,

    /// Source port
    #[arg(long, env = "TABLEDUMP_PORT", help = "Source port (defaults per dialect)")]
    pub port: Option<String>,

    /// Database name
    #[arg(long, env = "TABLEDUMP_DATABASE")]
    pub database: Option<String>,

    /// Login user
    #[arg(long, env = "TABLEDUMP_USERNAME")]
    pub username: Option<String>,

    /// Login password
    #[arg(
        long,
        env = "TABLEDUMP_PASSWORD",
        hide_env_values = true,
        help = "Password (prefer the environment variable or --prompt-password)"
    )]
    pub password: Option<String>,

    /// Prompt for the password
    #[arg(long, help = "Read the password from the terminal when none is given")]
    pub prompt_password: bool,
}

impl std::fmt::Debug for SourceArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceArgs")
            .field("adapter", &self.adapter)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("has_password", &self.password.is_some())
            .field("prompt_password", &self.prompt_password)
            .finish()
    }
}

impl SourceArgs {
    /// Builds credentials from the parsed arguments.
    ///
    /// When no password was given and `prompt_password` is set, `prompt` is
    /// called to read one.
    ///
    /// # Errors
    /// Returns a configuration error for missing fields, an unknown adapter
    /// code, an invalid port or a failed prompt.
    pub fn credentials<F>(&self, prompt: F) -> tabledump_core::Result<Credentials>
    where
        F: FnOnce() -> std::io::Result<String>,
    {
        let fields = [
            ("adapter", &self.adapter),
            ("host", &self.host),
            ("port", &self.port),
            ("database_name", &self.database),
            ("username", &self.username),
        ];
        let map: HashMap<String, String> = fields
            .into_iter()
            .filter_map(|(key, value)| value.clone().map(|v| (key.to_string(), v)))
            .collect();
        let credentials = Credentials::from_map(&map)?;

        let password = match &self.password {
            Some(password) => Some(Zeroizing::new(password.clone())),
            None if self.prompt_password => Some(Zeroizing::new(prompt().map_err(|e| {
                ExtractError::configuration(format!("Failed to read password: {}", e))
            })?)),
            None => None,
        };

        Ok(match password.filter(|p| !p.is_empty()) {
            Some(password) => credentials.with_password(password.as_str()),
            None => credentials,
        })
    }
}

impl Cli {
    /// Extraction settings for a dialect, with the CLI overrides applied.
    pub fn extraction_config(&self, dialect: Dialect) -> ExtractionConfig {
        let config =
            ExtractionConfig::for_dialect(dialect).with_channel_capacity(self.channel_capacity);
        match self.page_size {
            Some(page_size) => config.with_page_size(page_size),
            None => config,
        }
    }
}

/// Logging flags shared by every command.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, help = "Suppress all logging except errors")]
    pub quiet: bool,
}
