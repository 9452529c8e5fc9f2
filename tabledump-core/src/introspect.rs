//! Schema introspection on top of a [`SourceAdapter`].
//!
//! Adapters report raw metadata; this module applies the rules that are the
//! same for every dialect: table names are trimmed and blanks dropped,
//! invalid columns are discarded, and the table schema is derived once.

use crate::Result;
use crate::adapters::SourceAdapter;
use crate::models::TableLayout;

/// Base tables of `schema` in the adapter's (name) order, trimmed, without
/// blank names.
pub async fn list_tables(adapter: &dyn SourceAdapter, schema: &str) -> Result<Vec<String>> {
    let tables: Vec<String> = adapter
        .list_tables(schema)
        .await?
        .into_iter()
        .filter_map(|name| {
            let trimmed = name.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect();

    tracing::debug!("Found {} tables in schema '{}'", tables.len(), schema);
    Ok(tables)
}

/// Valid columns and derived schema of one table.
pub async fn table_layout(
    adapter: &dyn SourceAdapter,
    schema: &str,
    table: &str,
) -> Result<TableLayout> {
    let reported = adapter.table_columns(schema, table).await?;
    let reported_count = reported.len();
    let layout = TableLayout::new(table, reported);

    if layout.columns.len() < reported_count {
        tracing::debug!(
            "Discarded {} invalid columns of table '{}'",
            reported_count - layout.columns.len(),
            table
        );
    }
    Ok(layout)
}
