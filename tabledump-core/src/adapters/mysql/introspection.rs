//! Table, column, primary-key and row-count queries for MySQL.
//!
//! `information_schema` text columns are cast to `CHAR` so they decode as
//! strings regardless of the server's binary collation.

use crate::Result;
use crate::adapters::helpers::RowExt;
use crate::adapters::query;
use crate::dialect::Dialect;
use crate::error::ExtractError;
use crate::models::ColumnInfo;
use sqlx::MySqlPool;

pub(crate) async fn list_tables(pool: &MySqlPool, db_name: &str) -> Result<Vec<String>> {
    let rows = sqlx::query(&query::list_tables_sql(Dialect::MySQL))
        .bind(db_name)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            ExtractError::introspection_failed(
                format!("Failed to list tables of database '{}'", db_name),
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
    pool: &MySqlPool,
    db_name: &str,
    table: &str,
) -> Result<Vec<ColumnInfo>> {
    let rows = sqlx::query(&query::table_columns_sql(Dialect::MySQL))
        .bind(db_name)
        .bind(table)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            ExtractError::introspection_failed(
                format!(
                    "Failed to collect columns for table '{}.{}'",
                    db_name, table
                ),
                e,
            )
        })?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in &rows {
        columns.push(ColumnInfo::from_reported(
            row.get_field("column_name", Some(table))?,
            row.get_field("data_type", Some(table))?,
            row.get_field("character_maximum_length", Some(table))?,
            None,
        ));
    }
    Ok(columns)
}

pub(crate) async fn count_rows(pool: &MySqlPool, db_name: &str, table: &str) -> Result<u64> {
    let count: i64 = sqlx::query_scalar(&query::count_rows_sql(Dialect::MySQL, db_name, table))
        .fetch_one(pool)
        .await
        .map_err(|e| {
            ExtractError::introspection_failed(
                format!("Failed to count rows of table '{}.{}'", db_name, table),
                e,
            )
        })?;

    Ok(u64::try_from(count).unwrap_or(0))
}

pub(crate) async fn primary_key_columns(
    pool: &MySqlPool,
    db_name: &str,
    table: &str,
) -> Result<Vec<String>> {
    let rows = sqlx::query(&query::primary_key_sql(Dialect::MySQL))
        .bind(db_name)
        .bind(table)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            ExtractError::introspection_failed(
                format!(
                    "Failed to collect primary key for table '{}.{}'",
                    db_name, table
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
