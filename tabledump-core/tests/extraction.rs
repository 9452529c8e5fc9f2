//! Extraction pipeline tests against an in-memory source.

use async_trait::async_trait;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tabledump_core::adapters::PageRequest;
use tabledump_core::models::{TABLE_NAME_KEY, TABLE_SCHEMA_KEY};
use tabledump_core::{
    CellValue, ColumnInfo, Dialect, Event, ExtractError, ExtractionConfig, RawRow, Result,
    SkipReason, SourceAdapter, extract, spawn_extraction,
};
use tokio::sync::mpsc;

#[derive(Default, Clone)]
struct MemoryTable {
    columns: Vec<ColumnInfo>,
    primary_key: Vec<String>,
    rows: Vec<RawRow>,
}

/// Source whose tables live in memory, sorted by primary key.
struct MemorySource {
    dialect: Dialect,
    tables: BTreeMap<String, MemoryTable>,
    /// Fails the page request with this (table, page)
    failing_page: Option<(String, u64)>,
    pages: Mutex<Vec<(String, u64, Option<u32>)>>,
}

impl MemorySource {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            tables: BTreeMap::new(),
            failing_page: None,
            pages: Mutex::new(Vec::new()),
        }
    }

    fn with_table(mut self, name: &str, table: MemoryTable) -> Self {
        self.tables.insert(name.to_string(), table);
        self
    }

    fn failing_on(mut self, table: &str, page: u64) -> Self {
        self.failing_page = Some((table.to_string(), page));
        self
    }

    fn table(&self, name: &str) -> Result<&MemoryTable> {
        self.tables.get(name).ok_or_else(|| {
            ExtractError::introspection_failed(
                format!("Unknown table '{}'", name),
                std::io::Error::other("relation does not exist"),
            )
        })
    }

    fn page_log(&self) -> Vec<(String, u64, Option<u32>)> {
        self.pages.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceAdapter for MemorySource {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn list_tables(&self, _schema: &str) -> Result<Vec<String>> {
        Ok(self.tables.keys().cloned().collect())
    }

    async fn table_columns(&self, _schema: &str, table: &str) -> Result<Vec<ColumnInfo>> {
        Ok(self.table(table)?.columns.clone())
    }

    async fn count_rows(&self, _schema: &str, table: &str) -> Result<u64> {
        Ok(self.table(table)?.rows.len() as u64)
    }

    async fn primary_key_columns(&self, _schema: &str, table: &str) -> Result<Vec<String>> {
        Ok(self.table(table)?.primary_key.clone())
    }

    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<Vec<RawRow>> {
        self.pages.lock().unwrap().push((
            request.table.to_string(),
            request.page,
            request.page_size,
        ));

        if self.failing_page.as_ref() == Some(&(request.table.to_string(), request.page)) {
            return Err(ExtractError::extraction_failed(
                format!("Failed to fetch page {} of '{}'", request.page, request.table),
                std::io::Error::other("connection reset"),
            ));
        }

        let rows = &self.table(request.table)?.rows;
        let offset = request.offset() as usize;
        let rows = match request.page_size {
            Some(size) => rows.iter().skip(offset).take(size as usize).cloned().collect(),
            None => rows.clone(),
        };
        Ok(rows)
    }
}

fn id_rows(count: i64) -> Vec<RawRow> {
    (1..=count)
        .map(|id| {
            vec![
                ("id".to_string(), CellValue::Int(id)),
                ("name".to_string(), CellValue::Text(format!("user-{}", id))),
            ]
        })
        .collect()
}

fn users_table(count: i64) -> MemoryTable {
    MemoryTable {
        columns: vec![
            ColumnInfo::new("id", "integer"),
            ColumnInfo::new("name", "character varying").with_length(64),
        ],
        primary_key: vec!["id".to_string()],
        rows: id_rows(count),
    }
}

async fn collect(
    source: &MemorySource,
    config: ExtractionConfig,
) -> (
    Vec<Event>,
    std::result::Result<tabledump_core::ExtractionSummary, tabledump_core::ExtractionAborted>,
) {
    let (sender, mut receiver) = mpsc::channel(16);
    let (events, outcome) = tokio::join!(
        async {
            let mut events = Vec::new();
            while let Some(event) = receiver.recv().await {
                events.push(event);
            }
            events
        },
        extract(source, "public", config, sender)
    );
    (events, outcome)
}

#[tokio::test]
async fn test_pages_cover_every_row_once() {
    let source = MemorySource::new(Dialect::PostgreSQL).with_table("users", users_table(25));
    let config = ExtractionConfig::for_dialect(Dialect::PostgreSQL).with_page_size(10);

    let (events, outcome) = collect(&source, config).await;
    let summary = outcome.unwrap();

    assert_eq!(summary.events_emitted, 25);
    assert_eq!(summary.tables_extracted, 1);
    assert!(summary.tables_skipped.is_empty());

    let ids: Vec<i64> = events
        .iter()
        .map(|e| e.get("id").and_then(|v| v.as_i64()).unwrap())
        .collect();
    assert_eq!(ids, (1..=25).collect::<Vec<_>>());

    let pages: Vec<u64> = source.page_log().iter().map(|(_, page, _)| *page).collect();
    assert_eq!(pages, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_exact_multiple_has_no_trailing_empty_page() {
    let source = MemorySource::new(Dialect::MySQL).with_table("users", users_table(20));
    let config = ExtractionConfig::for_dialect(Dialect::MySQL).with_page_size(10);

    let (events, outcome) = collect(&source, config).await;
    assert_eq!(outcome.unwrap().events_emitted, 20);
    assert_eq!(events.len(), 20);
    assert_eq!(source.page_log().len(), 2);
}

#[tokio::test]
async fn test_events_carry_table_and_schema() {
    let source = MemorySource::new(Dialect::PostgreSQL).with_table("users", users_table(1));
    let (events, outcome) = collect(&source, ExtractionConfig::for_dialect(Dialect::PostgreSQL)).await;
    outcome.unwrap();

    assert_eq!(
        events[0].to_json(),
        json!({
            "id": 1,
            "name": "user-1",
            TABLE_NAME_KEY: "users",
            TABLE_SCHEMA_KEY: { "id": "integer", "name": "varchar(64)" }
        })
    );
}

#[tokio::test]
async fn test_empty_and_keyless_tables_are_skipped() {
    let keyless = MemoryTable {
        primary_key: Vec::new(),
        ..users_table(3)
    };
    let source = MemorySource::new(Dialect::PostgreSQL)
        .with_table("audit_log", keyless)
        .with_table("drafts", users_table(0))
        .with_table("users", users_table(2));

    let (events, outcome) = collect(&source, ExtractionConfig::for_dialect(Dialect::PostgreSQL)).await;
    let summary = outcome.unwrap();

    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e.table() == "users"));
    assert_eq!(summary.tables_extracted, 1);

    let skipped: Vec<(&str, SkipReason)> = summary
        .tables_skipped
        .iter()
        .map(|s| (s.table.as_str(), s.reason))
        .collect();
    assert_eq!(
        skipped,
        vec![
            ("audit_log", SkipReason::NoPrimaryKey),
            ("drafts", SkipReason::Empty),
        ]
    );

    // Skipped tables issue no page queries
    assert!(source.page_log().iter().all(|(table, _, _)| table == "users"));
}

#[tokio::test]
async fn test_table_without_valid_columns_is_skipped() {
    let broken = MemoryTable {
        columns: vec![ColumnInfo::new("", "integer"), ColumnInfo::new("x", "")],
        ..users_table(4)
    };
    let source = MemorySource::new(Dialect::PostgreSQL).with_table("broken", broken);

    let (events, outcome) = collect(&source, ExtractionConfig::for_dialect(Dialect::PostgreSQL)).await;
    let summary = outcome.unwrap();

    assert!(events.is_empty());
    assert_eq!(summary.tables_skipped[0].reason, SkipReason::NoColumns);
}

#[tokio::test]
async fn test_redshift_reads_one_unbounded_page_without_key() {
    let keyless = MemoryTable {
        primary_key: Vec::new(),
        ..users_table(30_000)
    };
    let source = MemorySource::new(Dialect::Redshift).with_table("events", keyless);
    let config = ExtractionConfig::for_dialect(Dialect::Redshift).with_page_size(10);

    let (events, outcome) = collect(&source, config).await;

    assert_eq!(outcome.unwrap().events_emitted, 30_000);
    assert_eq!(events.len(), 30_000);
    assert_eq!(source.page_log(), vec![("events".to_string(), 0, None)]);
}

#[tokio::test]
async fn test_failure_reports_emitted_prefix() {
    let source = MemorySource::new(Dialect::PostgreSQL)
        .with_table("accounts", users_table(5))
        .with_table("users", users_table(25))
        .failing_on("users", 1);
    let config = ExtractionConfig::for_dialect(Dialect::PostgreSQL).with_page_size(10);

    let (events, outcome) = collect(&source, config).await;
    let aborted = outcome.unwrap_err();

    // All of accounts plus the first page of users
    assert_eq!(aborted.events_emitted, 15);
    assert_eq!(events.len(), 15);
    assert!(matches!(aborted.source, ExtractError::Extraction { .. }));
    assert!(aborted.to_string().contains("page 1 of 'users'"));

    // Nothing after the failing page is attempted
    assert_eq!(source.page_log().last(), Some(&("users".to_string(), 1, Some(10))));
}

#[tokio::test]
async fn test_closed_stream_stops_extraction() {
    let source = MemorySource::new(Dialect::PostgreSQL).with_table("users", users_table(50));
    let config = ExtractionConfig::for_dialect(Dialect::PostgreSQL).with_page_size(10);

    let (sender, receiver) = mpsc::channel(4);
    drop(receiver);

    let aborted = extract(&source, "public", config, sender).await.unwrap_err();
    assert_eq!(aborted.events_emitted, 0);
    assert!(matches!(
        aborted.source,
        ExtractError::StreamClosed { events_emitted: 0 }
    ));
    assert_eq!(source.page_log().len(), 1);
}

#[tokio::test]
async fn test_invalid_config_aborts_before_any_query() {
    let source = MemorySource::new(Dialect::PostgreSQL).with_table("users", users_table(3));
    let config = ExtractionConfig::for_dialect(Dialect::PostgreSQL).with_page_size(0);

    let (events, outcome) = collect(&source, config).await;
    let aborted = outcome.unwrap_err();

    assert!(events.is_empty());
    assert!(matches!(aborted.source, ExtractError::Configuration { .. }));
    assert!(source.page_log().is_empty());
}

#[tokio::test]
async fn test_paged_config_on_redshift_is_rejected() {
    let keyless = MemoryTable {
        primary_key: Vec::new(),
        ..users_table(3)
    };
    let source = MemorySource::new(Dialect::Redshift).with_table("events", keyless);
    let config = ExtractionConfig::for_dialect(Dialect::PostgreSQL);

    let (events, outcome) = collect(&source, config).await;
    let aborted = outcome.unwrap_err();

    assert!(events.is_empty());
    assert!(matches!(aborted.source, ExtractError::Configuration { .. }));
    assert!(source.page_log().is_empty());
}

#[tokio::test]
async fn test_composite_columns_are_normalized() {
    let table = MemoryTable {
        columns: vec![
            ColumnInfo::new("id", "integer"),
            ColumnInfo::new("tags", "ARRAY").with_user_defined_type("_text"),
            ColumnInfo::new("scores", "ARRAY").with_user_defined_type("_int4"),
            ColumnInfo::new("attrs", "USER-DEFINED").with_user_defined_type("hstore"),
            ColumnInfo::new("colors", "set"),
        ],
        primary_key: vec!["id".to_string()],
        rows: vec![vec![
            ("id".to_string(), CellValue::Int(1)),
            ("tags".to_string(), CellValue::Text("{a,b}".to_string())),
            ("scores".to_string(), CellValue::Text("{{1,2},{3,4}}".to_string())),
            ("attrs".to_string(), CellValue::Text(r#""k"=>"v""#.to_string())),
            ("colors".to_string(), CellValue::Text("red,green".to_string())),
        ]],
    };
    let source = MemorySource::new(Dialect::PostgreSQL).with_table("items", table);

    let (events, outcome) = collect(&source, ExtractionConfig::for_dialect(Dialect::PostgreSQL)).await;
    outcome.unwrap();

    let event = &events[0];
    assert_eq!(event.get("tags"), Some(&json!(r#"["a","b"]"#)));
    assert_eq!(event.get("scores"), Some(&json!("[[1,2],[3,4]]")));
    assert_eq!(event.get("attrs"), Some(&json!(r#"{"k":"v"}"#)));
    assert_eq!(event.get("colors"), Some(&json!(r#"["red","green"]"#)));
    assert_eq!(event.schema().get("tags"), Some("varchar(max)"));
    assert_eq!(event.schema().get("attrs"), Some("varchar(max)"));
}

#[tokio::test]
async fn test_spawned_extraction_closes_stream() {
    let source: Arc<dyn SourceAdapter> = Arc::new(
        MemorySource::new(Dialect::MySQL)
            .with_table("a", users_table(3))
            .with_table("b", users_table(4)),
    );
    let config = ExtractionConfig::for_dialect(Dialect::MySQL).with_channel_capacity(1);

    let (mut events, handle) = spawn_extraction(source, "shop".to_string(), config).unwrap();

    let mut tables = Vec::new();
    while let Some(event) = events.recv().await {
        tables.push(event.table().to_string());
    }
    let summary = handle.await.unwrap().unwrap();

    assert_eq!(summary.events_emitted, 7);
    assert_eq!(tables.iter().filter(|t| *t == "a").count(), 3);
    assert_eq!(tables.last().map(String::as_str), Some("b"));
}

#[test]
fn test_spawn_rejects_zero_capacity() {
    let source: Arc<dyn SourceAdapter> = Arc::new(MemorySource::new(Dialect::MySQL));
    let config = ExtractionConfig::for_dialect(Dialect::MySQL).with_channel_capacity(0);
    assert!(spawn_extraction(source, "shop".to_string(), config).is_err());
}

#[test]
fn test_spawn_rejects_config_for_other_dialect() {
    let source: Arc<dyn SourceAdapter> = Arc::new(MemorySource::new(Dialect::MySQL));
    let config = ExtractionConfig::for_dialect(Dialect::Redshift);
    assert!(spawn_extraction(source, "shop".to_string(), config).is_err());
}
