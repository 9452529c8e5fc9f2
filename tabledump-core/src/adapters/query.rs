//! SQL text for introspection and page queries.
//!
//! Schema and table names are passed as bind parameters; only the page and
//! count queries interpolate identifiers, always through
//! [`Dialect::quote_identifier`].

use crate::dialect::Dialect;

/// Lists base tables of one schema, ordered by name.
pub fn list_tables_sql(dialect: Dialect) -> String {
    match dialect {
        Dialect::MySQL => format!(
            "SELECT CAST(TABLE_NAME AS CHAR) AS table_name \
             FROM information_schema.TABLES \
             WHERE TABLE_SCHEMA = {} AND TABLE_TYPE = 'BASE TABLE' \
             ORDER BY TABLE_NAME",
            dialect.placeholder(1)
        ),
        Dialect::PostgreSQL | Dialect::Redshift => format!(
            "SELECT CAST(table_name AS TEXT) AS table_name \
             FROM information_schema.tables \
             WHERE table_schema = {} AND table_type = 'BASE TABLE' \
             ORDER BY table_name",
            dialect.placeholder(1)
        ),
    }
}

/// Column metadata of one table in ordinal order.
///
/// Only PostgreSQL is asked for `udt_name`; Redshift returns NULL in its
/// place and MySQL omits the column.
pub fn table_columns_sql(dialect: Dialect) -> String {
    match dialect {
        Dialect::MySQL => format!(
            "SELECT CAST(COLUMN_NAME AS CHAR) AS column_name, \
             CAST(DATA_TYPE AS CHAR) AS data_type, \
             CAST(CHARACTER_MAXIMUM_LENGTH AS SIGNED) AS character_maximum_length \
             FROM information_schema.COLUMNS \
             WHERE TABLE_SCHEMA = {} AND TABLE_NAME = {} \
             ORDER BY ORDINAL_POSITION ASC",
            dialect.placeholder(1),
            dialect.placeholder(2)
        ),
        Dialect::PostgreSQL | Dialect::Redshift => {
            let udt = if dialect.reports_user_defined_type() {
                "CAST(udt_name AS TEXT)"
            } else {
                "CAST(NULL AS TEXT)"
            };
            format!(
                "SELECT CAST(column_name AS TEXT) AS column_name, \
                 CAST(data_type AS TEXT) AS data_type, \
                 CAST(character_maximum_length AS BIGINT) AS character_maximum_length, \
                 {} AS udt_name \
                 FROM information_schema.columns \
                 WHERE table_schema = {} AND table_name = {} \
                 ORDER BY ordinal_position ASC",
                udt,
                dialect.placeholder(1),
                dialect.placeholder(2)
            )
        }
    }
}

/// Primary-key columns of one table in key order.
pub fn primary_key_sql(dialect: Dialect) -> String {
    let cast_type = match dialect {
        Dialect::MySQL => "CHAR",
        Dialect::PostgreSQL | Dialect::Redshift => "TEXT",
    };
    format!(
        "SELECT CAST(k.column_name AS {}) AS column_name \
         FROM information_schema.table_constraints t \
         JOIN information_schema.key_column_usage k \
         ON k.constraint_name = t.constraint_name \
         AND k.table_schema = t.table_schema \
         AND k.table_name = t.table_name \
         WHERE t.constraint_type = 'PRIMARY KEY' \
         AND t.table_schema = {} AND t.table_name = {} \
         ORDER BY k.ordinal_position",
        cast_type,
        dialect.placeholder(1),
        dialect.placeholder(2)
    )
}

fn qualified_table(dialect: Dialect, schema: &str, table: &str) -> String {
    format!(
        "{}.{}",
        dialect.quote_identifier(schema),
        dialect.quote_identifier(table)
    )
}

/// Total row count of one table.
pub fn count_rows_sql(dialect: Dialect, schema: &str, table: &str) -> String {
    format!("SELECT COUNT(*) FROM {}", qualified_table(dialect, schema, table))
}

/// One page of rows.
///
/// With `page_size` set, rows are ordered by the primary-key columns
/// ascending and windowed by `LIMIT page_size OFFSET page_size * page`.
/// Without it the whole table is selected in natural order.
pub fn page_sql(
    dialect: Dialect,
    schema: &str,
    table: &str,
    columns: &[&str],
    primary_key: &[String],
    page_size: Option<u32>,
    page: u64,
) -> String {
    let select_list = columns
        .iter()
        .map(|c| dialect.quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");
    let mut sql = format!(
        "SELECT {} FROM {}",
        select_list,
        qualified_table(dialect, schema, table)
    );

    if let Some(limit) = page_size {
        let order_by = primary_key
            .iter()
            .map(|c| format!("{} ASC", dialect.quote_identifier(c)))
            .collect::<Vec<_>>()
            .join(", ");
        let offset = u64::from(limit) * page;
        sql.push_str(&format!(
            " ORDER BY {} LIMIT {} OFFSET {}",
            order_by, limit, offset
        ));
    }

    sql
}
