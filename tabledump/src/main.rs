//! Relational table extraction tool.
//!
//! Connects to one PostgreSQL, MySQL or Redshift source, reads every base
//! table of its schema page by page and writes one JSON event per row.
//!
//! # Security Guarantees
//! - Read-only sessions where the source supports them
//! - Passwords are zeroed after use and never logged
//! - Connection URLs are redacted in every diagnostic

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tabledump::output::{NdjsonSink, file_sink, stdout_sink};
use tabledump::{Cli, Command};
use tabledump_core::{
    Credentials, ExtractionSummary, SourceAdapter, create_adapter, init_logging, spawn_extraction,
};
use tokio::io::AsyncWrite;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    match cli.command.unwrap_or(Command::Extract) {
        Command::List => {
            list_supported_dialects();
            Ok(())
        }
        Command::Test => test_connection(&cli).await,
        Command::Extract => run_extraction(&cli).await,
    }
}

fn credentials(cli: &Cli) -> Result<Credentials> {
    let credentials = cli
        .source
        .credentials(|| rpassword::prompt_password("Source password: "))?;
    Ok(credentials)
}

/// Connects and pings without extracting anything.
async fn test_connection(cli: &Cli) -> Result<()> {
    info!("Testing source connection...");

    let credentials = credentials(cli)?;
    let adapter = create_adapter(&credentials).await.map_err(|e| {
        error!("Connection test failed: {}", e);
        e
    })?;

    info!("✓ Connection test successful");
    println!("Connection to {} source successful", adapter.dialect());
    adapter.close().await;
    Ok(())
}

/// Runs one extraction and writes its events.
async fn run_extraction(cli: &Cli) -> Result<()> {
    let credentials = credentials(cli)?;
    let dialect = credentials.dialect()?;
    let schema = dialect.schema_name(&credentials.database_name);
    let config = cli.extraction_config(dialect);

    info!("Starting extraction from {} schema '{}'", dialect, schema);
    if let Some(path) = &cli.output {
        info!("Output: {}", path.display());
    }

    let adapter: Arc<dyn SourceAdapter> = create_adapter(&credentials)
        .await
        .context("Failed to connect to source")?
        .into();
    drop(credentials);

    let outcome = match &cli.output {
        Some(path) => {
            let sink = file_sink(path).await?;
            stream_events(Arc::clone(&adapter), schema, config, sink).await
        }
        None => stream_events(Arc::clone(&adapter), schema, config, stdout_sink()).await,
    };
    adapter.close().await;

    let summary = outcome?;
    report(&summary);
    Ok(())
}

async fn stream_events<W>(
    adapter: Arc<dyn SourceAdapter>,
    schema: String,
    config: tabledump_core::ExtractionConfig,
    mut sink: NdjsonSink<W>,
) -> Result<ExtractionSummary>
where
    W: AsyncWrite + Unpin,
{
    let (mut events, handle) = spawn_extraction(adapter, schema, config)?;

    // A failed write drops the receiver, which stops the producer.
    let drained = sink.drain(&mut events).await;
    drop(events);
    let extraction = handle.await.context("Extraction task panicked")?;
    let written = drained?;
    sink.finish().await?;

    match extraction {
        Ok(summary) => {
            info!("✓ Wrote {} events", written);
            Ok(summary)
        }
        Err(aborted) => {
            error!(
                "Extraction aborted after {} events were emitted",
                aborted.events_emitted
            );
            Err(aborted.into())
        }
    }
}

fn report(summary: &ExtractionSummary) {
    for skipped in &summary.tables_skipped {
        warn!("Skipped table '{}': {}", skipped.table, skipped.reason);
    }
    info!(
        "Extraction completed: {} events from {} tables, {} skipped",
        summary.events_emitted,
        summary.tables_extracted,
        summary.tables_skipped.len()
    );
}

/// Lists supported dialects and their adapter codes
fn list_supported_dialects() {
    println!("Supported Source Dialects:");
    println!();

    #[cfg(feature = "mysql")]
    {
        println!("MySQL:");
        println!("  Adapter code: 0");
        println!("  Schema:       the database name");
        println!("  Paging:       10000 rows per page, ordered by primary key");
        println!();
    }

    #[cfg(feature = "postgresql")]
    {
        println!("PostgreSQL:");
        println!("  Adapter code: 2");
        println!("  Schema:       public");
        println!("  Paging:       10000 rows per page, ordered by primary key");
        println!();
        println!("Redshift:");
        println!("  Adapter code: 3");
        println!("  Schema:       public");
        println!("  Paging:       one page per table");
        println!();
    }

    println!("Output Format:");
    println!("  NDJSON, one event per row, with _table_name and _table_schema");
}
