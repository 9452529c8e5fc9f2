//! Helper utilities for source adapter implementations.
//!
//! Page queries run over the text protocol, so every value arrives as text.
//! [`ValueKind`] decides from the column's reported type whether that text
//! is turned back into a native number or boolean, or kept as a string.

use crate::models::CellValue;

/// Native representation chosen for a result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Decoded as a boolean
    Bool,
    /// Decoded as a 64-bit integer
    Int,
    /// Decoded as a float
    Float,
    /// Kept as text
    Text,
}

impl ValueKind {
    /// Classifies a driver type name (`INT4`, `BIGINT UNSIGNED`, `BOOL`, ...).
    pub fn from_type_name(type_name: &str) -> Self {
        let upper = type_name.to_ascii_uppercase();
        let base = upper.strip_suffix(" UNSIGNED").unwrap_or(&upper);
        match base {
            "BOOL" | "BOOLEAN" => ValueKind::Bool,
            "INT2" | "INT4" | "INT8" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
                ValueKind::Int
            }
            "FLOAT4" | "FLOAT8" | "FLOAT" | "DOUBLE" => ValueKind::Float,
            _ => ValueKind::Text,
        }
    }

    /// Converts the text form of a value into a cell.
    ///
    /// Text that does not parse as the expected kind (an unsigned value past
    /// `i64::MAX`, say) is kept as text rather than dropped.
    pub fn cell(self, text: Option<String>) -> CellValue {
        let Some(text) = text else {
            return CellValue::Null;
        };
        match self {
            ValueKind::Bool => match text.as_str() {
                "t" | "true" | "1" => CellValue::Bool(true),
                "f" | "false" | "0" => CellValue::Bool(false),
                _ => CellValue::Text(text),
            },
            ValueKind::Int => text
                .parse::<i64>()
                .map(CellValue::Int)
                .unwrap_or(CellValue::Text(text)),
            ValueKind::Float => match text.parse::<f64>() {
                Ok(f) => CellValue::Float(f),
                Err(_) => CellValue::Text(text),
            },
            ValueKind::Text => CellValue::Text(text),
        }
    }
}

#[cfg(any(feature = "postgresql", feature = "mysql"))]
pub use sqlx_rows::{RowExt, decode_row};

#[cfg(any(feature = "postgresql", feature = "mysql"))]
mod sqlx_rows {
    use super::ValueKind;
    use crate::models::RawRow;
    use crate::{Result, error::ExtractError};
    use sqlx::{Column, Row, TypeInfo};

    /// Extension trait for extracting typed values from database rows
    /// with consistent error handling.
    ///
    /// # Example
    /// ```rust,ignore
    /// use tabledump_core::adapters::helpers::RowExt;
    ///
    /// let name: Option<String> = row.get_field("column_name", Some("users"))?;
    /// ```
    pub trait RowExt: Row {
        /// Extracts a typed field from the row with proper error context.
        ///
        /// # Arguments
        /// * `field_name` - Name of the column to extract
        /// * `table_context` - Optional table name for error messages
        fn get_field<'r, T>(&'r self, field_name: &str, table_context: Option<&str>) -> Result<T>
        where
            T: sqlx::Decode<'r, Self::Database> + sqlx::Type<Self::Database>;
    }

    impl<R> RowExt for R
    where
        R: Row,
        for<'a> &'a str: sqlx::ColumnIndex<R>,
    {
        fn get_field<'r, T>(&'r self, field_name: &str, table_context: Option<&str>) -> Result<T>
        where
            T: sqlx::Decode<'r, Self::Database> + sqlx::Type<Self::Database>,
        {
            self.try_get(field_name)
                .map_err(|e| ExtractError::parse_field(field_name, table_context, e))
        }
    }

    /// Decodes every column of a text-protocol row, keeping select order.
    ///
    /// Values that are not valid UTF-8 are decoded lossily.
    pub fn decode_row<R>(row: &R, table: &str) -> Result<RawRow>
    where
        R: Row,
        usize: sqlx::ColumnIndex<R>,
        for<'r> &'r str: sqlx::Decode<'r, R::Database>,
        for<'r> &'r [u8]: sqlx::Decode<'r, R::Database>,
    {
        let mut cells = Vec::with_capacity(row.len());
        for (index, column) in row.columns().iter().enumerate() {
            let kind = ValueKind::from_type_name(column.type_info().name());
            let text = match row.try_get_unchecked::<Option<&str>, _>(index) {
                Ok(text) => text.map(str::to_string),
                Err(_) => row
                    .try_get_unchecked::<Option<&[u8]>, _>(index)
                    .map_err(|e| {
                        ExtractError::extraction_failed(
                            format!(
                                "Failed to decode column '{}' of table '{}'",
                                column.name(),
                                table
                            ),
                            e,
                        )
                    })?
                    .map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
            };
            cells.push((column.name().to_string(), kind.cell(text)));
        }
        Ok(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kind_classification() {
        assert_eq!(ValueKind::from_type_name("BOOL"), ValueKind::Bool);
        assert_eq!(ValueKind::from_type_name("BOOLEAN"), ValueKind::Bool);
        assert_eq!(ValueKind::from_type_name("INT4"), ValueKind::Int);
        assert_eq!(ValueKind::from_type_name("BIGINT UNSIGNED"), ValueKind::Int);
        assert_eq!(ValueKind::from_type_name("float8"), ValueKind::Float);
        assert_eq!(ValueKind::from_type_name("DOUBLE"), ValueKind::Float);
        assert_eq!(ValueKind::from_type_name("NUMERIC"), ValueKind::Text);
        assert_eq!(ValueKind::from_type_name("TEXT[]"), ValueKind::Text);
        assert_eq!(ValueKind::from_type_name("hstore"), ValueKind::Text);
    }

    #[test]
    fn test_cell_conversion() {
        assert_eq!(ValueKind::Int.cell(Some("42".into())), CellValue::Int(42));
        assert_eq!(ValueKind::Int.cell(None), CellValue::Null);
        assert_eq!(
            ValueKind::Int.cell(Some("18446744073709551615".into())),
            CellValue::Text("18446744073709551615".into())
        );
        assert_eq!(ValueKind::Float.cell(Some("2.5".into())), CellValue::Float(2.5));
        assert_eq!(ValueKind::Bool.cell(Some("t".into())), CellValue::Bool(true));
        assert_eq!(ValueKind::Bool.cell(Some("0".into())), CellValue::Bool(false));
        assert_eq!(
            ValueKind::Text.cell(Some("{1,2}".into())),
            CellValue::Text("{1,2}".into())
        );
    }
}
