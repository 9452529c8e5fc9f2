//! Source type to warehouse type conversion.
//!
//! Every source column is assigned one canonical warehouse type. The mapping
//! is total: anything unrecognized becomes a plain `varchar`.

use serde::{Deserialize, Serialize};

/// Largest `char(n)` the warehouse accepts.
pub const MAX_CHAR_LENGTH: i64 = 255;
/// Largest `varchar(n)` the warehouse accepts.
pub const MAX_VARCHAR_LENGTH: i64 = 65_535;

const DEFAULT_CHAR_LENGTH: i64 = 1;
const DEFAULT_VARCHAR_LENGTH: i64 = 255;

/// Canonical warehouse column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarehouseType {
    /// 2-byte integer
    SmallInt,
    /// 4-byte integer
    Integer,
    /// 8-byte integer
    BigInt,
    /// Single-precision float
    Real,
    /// Double-precision float
    DoublePrecision,
    /// Boolean
    Boolean,
    /// Fixed-width character column, length already clamped
    Char(i64),
    /// Variable-width character column, length already clamped
    Varchar(i64),
    /// Unbounded text for composite and document values
    VarcharMax,
    /// Timestamp without time zone
    Timestamp,
    /// Calendar date
    Date,
    /// Fallback for unrecognized source types
    GenericVarchar,
}

impl std::fmt::Display for WarehouseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarehouseType::SmallInt => write!(f, "smallint"),
            WarehouseType::Integer => write!(f, "integer"),
            WarehouseType::BigInt => write!(f, "bigint"),
            WarehouseType::Real => write!(f, "real"),
            WarehouseType::DoublePrecision => write!(f, "double precision"),
            WarehouseType::Boolean => write!(f, "boolean"),
            WarehouseType::Char(n) => write!(f, "char({})", n),
            WarehouseType::Varchar(n) => write!(f, "varchar({})", n),
            WarehouseType::VarcharMax => write!(f, "varchar(max)"),
            WarehouseType::Timestamp => write!(f, "timestamp"),
            WarehouseType::Date => write!(f, "date"),
            WarehouseType::GenericVarchar => write!(f, "varchar"),
        }
    }
}

/// Clamps a `char` length into `1..=255`, defaulting to 1.
pub fn clamp_char_length(length: i64) -> i64 {
    if length >= MAX_CHAR_LENGTH {
        MAX_CHAR_LENGTH
    } else if length > 0 {
        length
    } else {
        DEFAULT_CHAR_LENGTH
    }
}

/// Clamps a `varchar` length into `1..=65535`, defaulting to 255.
pub fn clamp_varchar_length(length: i64) -> i64 {
    if length >= MAX_VARCHAR_LENGTH {
        MAX_VARCHAR_LENGTH
    } else if length > 0 {
        length
    } else {
        DEFAULT_VARCHAR_LENGTH
    }
}

/// Maps an effective parsing type and length to a warehouse type.
///
/// # Arguments
/// * `parsing_type` - Trimmed, lower-cased source type (see
///   [`ColumnInfo::parsing_type`](crate::models::ColumnInfo::parsing_type))
/// * `length` - Character length signal, 0 when unknown
pub fn map_warehouse_type(parsing_type: &str, length: i64) -> WarehouseType {
    match parsing_type.to_lowercase().as_str() {
        "smallint" | "int2" => WarehouseType::SmallInt,
        "integer" | "int" | "int4" => WarehouseType::Integer,
        "bigint" | "int8" => WarehouseType::BigInt,
        "real" | "float4" => WarehouseType::Real,
        "double precision" | "float8" | "float" | "decimal" | "numeric" => {
            WarehouseType::DoublePrecision
        }
        "boolean" | "bool" => WarehouseType::Boolean,
        "char" | "character" | "nchar" | "bpchar" => {
            WarehouseType::Char(clamp_char_length(length))
        }
        "varchar" | "character varying" | "nvarchar" | "text" => {
            WarehouseType::Varchar(clamp_varchar_length(length))
        }
        "array" | "json" | "hstore" | "mediumtext" | "longtext" => WarehouseType::VarcharMax,
        "timestamp" | "timestamp without time zone" | "datetime" => WarehouseType::Timestamp,
        "date" => WarehouseType::Date,
        _ => WarehouseType::GenericVarchar,
    }
}

/// Canonical warehouse type string for a parsing type and length.
///
/// # Example
/// ```rust
/// use tabledump_core::type_mapping::canonical_type;
///
/// assert_eq!(canonical_type("character varying", 100_000), "varchar(65535)");
/// assert_eq!(canonical_type("bpchar", 0), "char(1)");
/// assert_eq!(canonical_type("tsvector", 0), "varchar");
/// ```
pub fn canonical_type(parsing_type: &str, length: i64) -> String {
    map_warehouse_type(parsing_type, length).to_string()
}
