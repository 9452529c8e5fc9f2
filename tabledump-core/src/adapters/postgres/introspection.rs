//! Table, column, primary-key and row-count queries for PostgreSQL and
//! Redshift.

use super::PostgresAdapter;
use crate::adapters::helpers::RowExt;
use crate::adapters::query;
use crate::error::ExtractError;
use crate::models::ColumnInfo;
use crate::Result;

pub(crate) async fn list_tables(adapter: &PostgresAdapter, schema: &str) -> Result<Vec<String>> {
    let rows = sqlx::query(&query::list_tables_sql(adapter.config.dialect))
        .bind(schema)
        .fetch_all(&adapter.pool)
        .await
        .map_err(|e| {
            ExtractError::introspection_failed(
                format!("Failed to list tables of schema '{}'", schema),
                e,
            )
        })?;

    let mut tables = Vec::with_capacity(rows.len());
    for row in &rows {
        let name: Option<String> = row.get_field("table_name", None)?;
        tables.extend(name);
    }
    Ok(tables)
}

pub(crate) async fn table_columns(
    adapter: &PostgresAdapter,
    schema: &str,
    table: &str,
) -> Result<Vec<ColumnInfo>> {
    let rows = sqlx::query(&query::table_columns_sql(adapter.config.dialect))
        .bind(schema)
        .bind(table)
        .fetch_all(&adapter.pool)
        .await
        .map_err(|e| {
            ExtractError::introspection_failed(
                format!("Failed to collect columns for table '{}.{}'", schema, table),
                e,
            )
        })?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in &rows {
        columns.push(ColumnInfo::from_reported(
            row.get_field("column_name", Some(table))?,
            row.get_field("data_type", Some(table))?,
            row.get_field("character_maximum_length", Some(table))?,
            row.get_field("udt_name", Some(table))?,
        ));
    }
    Ok(columns)
}

pub(crate) async fn count_rows(adapter: &PostgresAdapter, schema: &str, table: &str) -> Result<u64> {
    let count: i64 = sqlx::query_scalar(&query::count_rows_sql(adapter.config.dialect, schema, table))
        .fetch_one(&adapter.pool)
        .await
        .map_err(|e| {
            ExtractError::introspection_failed(
                format!("Failed to count rows of table '{}.{}'", schema, table),
                e,
            )
        })?;

    Ok(u64::try_from(count).unwrap_or(0))
}

pub(crate) async fn primary_key_columns(
    adapter: &PostgresAdapter,
    schema: &str,
    table: &str,
) -> Result<Vec<String>> {
    let rows = sqlx::query(&query::primary_key_sql(adapter.config.dialect))
        .bind(schema)
        .bind(table)
        .fetch_all(&adapter.pool)
        .await
        .map_err(|e| {
            ExtractError::introspection_failed(
                format!(
                    "Failed to collect primary key for table '{}.{}'",
                    schema, table
                ),
                e,
            )
        })?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in &rows {
        let column: Option<String> = row.get_field("column_name", Some(table))?;
        columns.extend(column);
    }
    Ok(columns)
}
