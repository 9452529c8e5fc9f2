//! Paginated table extraction and the event stream.
//!
//! One producer walks the tables of a schema in order. For each table it
//! counts rows, resolves the ordering key, then fetches pages in increasing
//! order and sends every row as an [`Event`] on a bounded channel. The first
//! failed query or send ends the run.
//!
//! The sender is owned by the [`Extractor`] and dropped exactly once, when
//! [`Extractor::run`] returns, so the consumer sees end-of-stream on both
//! success and failure. The outcome travels separately as
//! `Result<ExtractionSummary, ExtractionAborted>`.

use crate::adapters::{ExtractionConfig, PageRequest, SourceAdapter};
use crate::error::{ExtractError, ExtractionAborted};
use crate::introspect;
use crate::models::Event;
use crate::Result;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Why a table produced no events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The table holds no rows
    Empty,
    /// A paginating dialect has no stable order without a primary key
    NoPrimaryKey,
    /// No column passed validation
    NoColumns,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Empty => write!(f, "table is empty"),
            SkipReason::NoPrimaryKey => write!(f, "no primary key to paginate by"),
            SkipReason::NoColumns => write!(f, "no valid columns"),
        }
    }
}

/// A table that was passed over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTable {
    /// Table name
    pub table: String,
    /// Why it was skipped
    pub reason: SkipReason,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionSummary {
    /// Events delivered to the stream
    pub events_emitted: u64,
    /// Tables whose every page was emitted
    pub tables_extracted: usize,
    /// Tables that produced no events, in visiting order
    pub tables_skipped: Vec<SkippedTable>,
}

/// Result of one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOutcome {
    /// All pages emitted
    Extracted {
        /// Events sent for the table
        events: u64,
    },
    /// Nothing emitted
    Skipped(SkipReason),
}

/// Number of pages for a table: one when unpaginated, else `⌈rows / size⌉`.
pub fn page_count(row_count: u64, page_size: Option<u32>) -> u64 {
    match page_size {
        Some(size) => row_count.div_ceil(u64::from(size.max(1))),
        None => 1,
    }
}

/// Single sequential producer of the event stream.
pub struct Extractor<'a> {
    adapter: &'a dyn SourceAdapter,
    config: ExtractionConfig,
    events: mpsc::Sender<Event>,
    emitted: u64,
}

impl<'a> Extractor<'a> {
    /// Creates an extractor that sends onto `events`.
    pub fn new(
        adapter: &'a dyn SourceAdapter,
        config: ExtractionConfig,
        events: mpsc::Sender<Event>,
    ) -> Self {
        Self {
            adapter,
            config,
            events,
            emitted: 0,
        }
    }

    /// Events sent so far.
    pub fn events_emitted(&self) -> u64 {
        self.emitted
    }

    /// Extracts every table of `schema`, then closes the stream.
    ///
    /// # Errors
    /// Returns [`ExtractionAborted`] with the number of events already sent
    /// when any introspection query, page query or send fails.
    pub async fn run(mut self, schema: &str) -> std::result::Result<ExtractionSummary, ExtractionAborted> {
        let mut summary = ExtractionSummary::default();
        let outcome = self.extract_schema(schema, &mut summary).await;
        summary.events_emitted = self.emitted;

        match outcome {
            Ok(()) => {
                tracing::info!(
                    "Extraction finished: {} events from {} tables ({} skipped)",
                    summary.events_emitted,
                    summary.tables_extracted,
                    summary.tables_skipped.len()
                );
                Ok(summary)
            }
            Err(source) => {
                tracing::error!("Extraction aborted after {} events: {}", self.emitted, source);
                Err(ExtractionAborted {
                    events_emitted: self.emitted,
                    source,
                })
            }
        }
    }

    async fn extract_schema(&mut self, schema: &str, summary: &mut ExtractionSummary) -> Result<()> {
        self.config.validate_for(self.adapter.dialect())?;

        let tables = introspect::list_tables(self.adapter, schema).await?;
        tracing::info!(
            "Extracting {} tables from {} schema '{}'",
            tables.len(),
            self.adapter.dialect(),
            schema
        );

        for table in tables {
            match self.extract_table(schema, &table).await? {
                TableOutcome::Extracted { .. } => summary.tables_extracted += 1,
                TableOutcome::Skipped(reason) => {
                    summary.tables_skipped.push(SkippedTable { table, reason })
                }
            }
        }
        Ok(())
    }

    /// Extracts one table.
    ///
    /// # Errors
    /// Returns the first failing query or a closed stream.
    pub async fn extract_table(&mut self, schema: &str, table: &str) -> Result<TableOutcome> {
        let row_count = self.adapter.count_rows(schema, table).await?;
        if row_count == 0 {
            tracing::debug!("Skipping table '{}': {}", table, SkipReason::Empty);
            return Ok(TableOutcome::Skipped(SkipReason::Empty));
        }

        let page_size = self.config.page_size;
        let primary_key = if page_size.is_some() {
            let primary_key = self.adapter.primary_key_columns(schema, table).await?;
            if primary_key.is_empty() {
                tracing::warn!(
                    "Skipping table '{}' ({} rows): {}",
                    table,
                    row_count,
                    SkipReason::NoPrimaryKey
                );
                return Ok(TableOutcome::Skipped(SkipReason::NoPrimaryKey));
            }
            primary_key
        } else {
            Vec::new()
        };

        let layout = introspect::table_layout(self.adapter, schema, table).await?;
        if layout.columns.is_empty() {
            tracing::warn!("Skipping table '{}': {}", table, SkipReason::NoColumns);
            return Ok(TableOutcome::Skipped(SkipReason::NoColumns));
        }

        let pages = page_count(row_count, page_size);
        tracing::info!(
            "Extracting table '{}': {} rows in {} pages",
            table,
            row_count,
            pages
        );

        let before = self.emitted;
        for page in 0..pages {
            let request = PageRequest {
                schema,
                table,
                columns: layout.column_names().collect(),
                primary_key: &primary_key,
                page_size,
                page,
            };
            let rows = self.adapter.fetch_page(&request).await?;
            tracing::debug!("Page {} of '{}' returned {} rows", page, table, rows.len());

            let events: Vec<Event> = rows
                .into_iter()
                .map(|row| Event::from_row(&layout, row))
                .collect();
            self.emit_page(events).await?;
        }

        let events = self.emitted - before;
        tracing::info!("Finished table '{}': {} events", table, events);
        Ok(TableOutcome::Extracted { events })
    }

    /// Sends one page of events in order.
    async fn emit_page(&mut self, events: Vec<Event>) -> Result<()> {
        for event in events {
            self.events
                .send(event)
                .await
                .map_err(|_| ExtractError::StreamClosed {
                    events_emitted: self.emitted,
                })?;
            self.emitted += 1;
        }
        Ok(())
    }
}

/// Runs one extraction over `events`.
///
/// The stream is closed when this returns.
pub async fn extract(
    adapter: &dyn SourceAdapter,
    schema: &str,
    config: ExtractionConfig,
    events: mpsc::Sender<Event>,
) -> std::result::Result<ExtractionSummary, ExtractionAborted> {
    Extractor::new(adapter, config, events).run(schema).await
}

/// Handle to an extraction running on the tokio runtime.
pub type ExtractionHandle = JoinHandle<std::result::Result<ExtractionSummary, ExtractionAborted>>;

/// Starts an extraction task and returns the receiving end of its stream.
///
/// # Example
/// ```rust,ignore
/// let adapter: Arc<dyn SourceAdapter> = create_adapter(&creds).await?.into();
/// let config = ExtractionConfig::for_dialect(adapter.dialect());
/// let (mut events, handle) = spawn_extraction(adapter, "public".to_string(), config)?;
/// while let Some(event) = events.recv().await {
///     println!("{}", event.to_json());
/// }
/// let summary = handle.await??;
/// ```
///
/// # Errors
/// Returns a configuration error if `config` is invalid for the adapter's
/// dialect
pub fn spawn_extraction(
    adapter: Arc<dyn SourceAdapter>,
    schema: String,
    config: ExtractionConfig,
) -> Result<(mpsc::Receiver<Event>, ExtractionHandle)> {
    config.validate_for(adapter.dialect())?;
    let (sender, receiver) = mpsc::channel(config.channel_capacity);
    let handle = tokio::spawn(async move {
        Extractor::new(adapter.as_ref(), config, sender)
            .run(&schema)
            .await
    });
    Ok((receiver, handle))
}
