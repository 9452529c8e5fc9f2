//! Core data models for extracted tables and events.
//!
//! [`ColumnInfo`] carries what the source reports about one column and derives
//! everything else (parsing type, warehouse type, element handling) from it.
//! [`TableLayout`] is the validated, ordered column set of one table plus its
//! shared [`TableSchema`]. [`Event`] is one normalized source row.

use crate::literal::{self, CompositeKind, ElementFormat};
use crate::type_mapping::{self, WarehouseType};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Event key holding the source table name.
pub const TABLE_NAME_KEY: &str = "_table_name";
/// Event key holding the full table schema.
pub const TABLE_SCHEMA_KEY: &str = "_table_schema";

/// Native type reported for enum, domain and extension types.
const USER_DEFINED_MARKER: &str = "user-defined";
/// Stand-in when a user-defined type carries no secondary signal.
const GENERIC_STRING_TYPE: &str = "varchar";

/// Lower-cases a reported type after trimming quotes, apostrophes,
/// underscores and spaces from both ends (`_int4` becomes `int4`).
fn normalize_type_name(raw: &str) -> String {
    raw.trim_matches(|c| matches!(c, '"' | '\'' | '_' | ' '))
        .to_lowercase()
}

/// Source column metadata as reported by `information_schema.columns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,
    /// Raw `data_type`, e.g. `character varying` or `USER-DEFINED`
    pub native_type: String,
    /// `character_maximum_length`, when reported
    pub length: Option<i64>,
    /// `udt_name`, consulted for user-defined types and array elements
    pub user_defined_type: Option<String>,
}

impl ColumnInfo {
    /// Creates column metadata without length or user-defined type.
    pub fn new(name: impl Into<String>, native_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            native_type: native_type.into(),
            length: None,
            user_defined_type: None,
        }
    }

    /// Builds column metadata from one `information_schema.columns` row.
    ///
    /// Missing name or type leave the column invalid; a blank user-defined
    /// type counts as absent.
    pub fn from_reported(
        name: Option<String>,
        native_type: Option<String>,
        length: Option<i64>,
        user_defined_type: Option<String>,
    ) -> Self {
        Self {
            name: name.unwrap_or_default(),
            native_type: native_type.unwrap_or_default(),
            length,
            user_defined_type: user_defined_type.filter(|udt| !udt.trim().is_empty()),
        }
    }

    /// Builder method to set the reported length.
    pub fn with_length(mut self, length: i64) -> Self {
        self.length = Some(length);
        self
    }

    /// Builder method to set the user-defined type signal.
    pub fn with_user_defined_type(mut self, udt: impl Into<String>) -> Self {
        self.user_defined_type = Some(udt.into());
        self
    }

    /// A column is usable only when both its name and type are known.
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty() && !self.native_type.is_empty()
    }

    /// Normalized user-defined type, `varchar` when none was reported.
    pub fn user_type(&self) -> String {
        match &self.user_defined_type {
            Some(udt) => normalize_type_name(udt),
            None => GENERIC_STRING_TYPE.to_string(),
        }
    }

    /// Effective type used for dispatch and mapping.
    pub fn parsing_type(&self) -> String {
        let parsing_type = normalize_type_name(&self.native_type);
        if parsing_type == USER_DEFINED_MARKER {
            self.user_type()
        } else {
            parsing_type
        }
    }

    /// Warehouse type of the column itself.
    pub fn warehouse_type(&self) -> WarehouseType {
        type_mapping::map_warehouse_type(&self.parsing_type(), self.length.unwrap_or(0))
    }

    /// Canonical warehouse type string, e.g. `varchar(255)`.
    pub fn canonical_type(&self) -> String {
        self.warehouse_type().to_string()
    }

    /// Warehouse type of array elements (the user-defined type, no length).
    pub fn element_type(&self) -> WarehouseType {
        type_mapping::map_warehouse_type(&self.user_type(), 0)
    }

    /// Whether array elements must be written as quoted strings.
    pub fn requires_quoting(&self) -> bool {
        self.element_format() == ElementFormat::Quoted
    }

    /// How array elements of this column are re-emitted.
    pub fn element_format(&self) -> ElementFormat {
        ElementFormat::for_element_type(self.element_type())
    }

    /// Composite literal family of the column, if any.
    pub fn composite_kind(&self) -> Option<CompositeKind> {
        CompositeKind::from_parsing_type(&self.parsing_type())
    }

    /// Literal handling for a composite column, `None` for plain columns.
    pub fn composite_codec(&self) -> Option<CompositeCodec> {
        self.composite_kind().map(|kind| CompositeCodec {
            kind,
            format: self.element_format(),
        })
    }
}

/// How text of one composite column is re-encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeCodec {
    /// Literal family
    pub kind: CompositeKind,
    /// Rendering of array elements
    pub format: ElementFormat,
}

/// Column name to canonical warehouse type, one per table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableSchema(BTreeMap<String, String>);

impl TableSchema {
    /// Builds the schema from valid columns; invalid ones are ignored.
    pub fn from_columns<'a>(columns: impl IntoIterator<Item = &'a ColumnInfo>) -> Self {
        Self(
            columns
                .into_iter()
                .filter(|c| c.is_valid())
                .map(|c| (c.name.clone(), c.canonical_type()))
                .collect(),
        )
    }

    /// Canonical type of a column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the table has no valid columns.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates `(column, canonical type)` pairs in column-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Validated column layout of one source table.
#[derive(Debug, Clone)]
pub struct TableLayout {
    /// Table name
    pub name: String,
    /// Valid columns in ordinal order
    pub columns: Vec<ColumnInfo>,
    /// Shared by every event of this table
    pub schema: Arc<TableSchema>,
    /// Composite columns only, keyed by name
    codecs: HashMap<String, CompositeCodec>,
}

impl TableLayout {
    /// Drops invalid columns and derives the table schema.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnInfo>) -> Self {
        let columns: Vec<ColumnInfo> = columns.into_iter().filter(ColumnInfo::is_valid).collect();
        let schema = Arc::new(TableSchema::from_columns(&columns));
        let codecs = columns
            .iter()
            .filter_map(|c| c.composite_codec().map(|codec| (c.name.clone(), codec)))
            .collect();
        Self {
            name: name.into(),
            columns,
            schema,
            codecs,
        }
    }

    /// Codec of a composite column.
    pub fn codec(&self, column: &str) -> Option<CompositeCodec> {
        self.codecs.get(column).copied()
    }

    /// Column names in ordinal order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// A single value as decoded from a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// SQL NULL
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Finite or non-finite float
    Float(f64),
    /// Text form of every other type
    Text(String),
}

/// One result row: column label and decoded value, in select order.
pub type RawRow = Vec<(String, CellValue)>;

/// Maps a decoded cell to its event value.
///
/// Text in array, set or hstore columns is re-encoded; every other value is
/// passed through, numbers and booleans staying native.
pub fn normalize_cell(codec: Option<CompositeCodec>, value: CellValue) -> JsonValue {
    match value {
        CellValue::Null => JsonValue::Null,
        CellValue::Bool(b) => JsonValue::Bool(b),
        CellValue::Int(n) => JsonValue::Number(n.into()),
        CellValue::Float(f) => serde_json::Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(f.to_string())),
        CellValue::Text(text) => match codec {
            Some(codec) => {
                JsonValue::String(literal::convert_literal(codec.kind, &text, codec.format))
            }
            None => JsonValue::String(text),
        },
    }
}

/// One normalized source row with its table metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    table: String,
    schema: Arc<TableSchema>,
    values: serde_json::Map<String, JsonValue>,
}

impl Event {
    /// Builds an event from a decoded row of `layout`'s table.
    pub fn from_row(layout: &TableLayout, row: RawRow) -> Self {
        let values = row
            .into_iter()
            .map(|(name, value)| {
                let normalized = normalize_cell(layout.codec(&name), value);
                (name, normalized)
            })
            .collect();
        Self {
            table: layout.name.clone(),
            schema: Arc::clone(&layout.schema),
            values,
        }
    }

    /// Source table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Schema of the source table.
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Normalized value of a column.
    pub fn get(&self, column: &str) -> Option<&JsonValue> {
        self.values.get(column)
    }

    /// All normalized column values.
    pub fn values(&self) -> &serde_json::Map<String, JsonValue> {
        &self.values
    }

    /// Flattens the event into one JSON object.
    ///
    /// The metadata keys are written last, so they win over a source column
    /// that happens to share their name.
    pub fn to_json(&self) -> JsonValue {
        let mut object = self.values.clone();
        object.insert(TABLE_NAME_KEY.to_string(), JsonValue::String(self.table.clone()));
        object.insert(
            TABLE_SCHEMA_KEY.to_string(),
            serde_json::to_value(self.schema.as_ref()).unwrap_or(JsonValue::Null),
        );
        JsonValue::Object(object)
    }
}

impl Serialize for Event {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_validity() {
        assert!(ColumnInfo::new("id", "integer").is_valid());
        assert!(!ColumnInfo::new("", "integer").is_valid());
        assert!(!ColumnInfo::new("id", "").is_valid());
    }

    #[test]
    fn test_from_reported() {
        let column = ColumnInfo::from_reported(
            Some("mood".into()),
            Some("USER-DEFINED".into()),
            None,
            Some("  ".into()),
        );
        assert_eq!(column.user_defined_type, None);
        assert_eq!(column.canonical_type(), "varchar(255)");

        let column = ColumnInfo::from_reported(None, Some("text".into()), Some(10), None);
        assert!(!column.is_valid());
        assert_eq!(column.length, Some(10));
    }

    #[test]
    fn test_parsing_type_normalization() {
        assert_eq!(ColumnInfo::new("a", "Character Varying").parsing_type(), "character varying");
        assert_eq!(ColumnInfo::new("a", "'_text_'").parsing_type(), "text");
        assert_eq!(ColumnInfo::new("a", "\"ARRAY\"").parsing_type(), "array");
    }

    #[test]
    fn test_user_defined_resolution() {
        let hstore = ColumnInfo::new("attrs", "USER-DEFINED").with_user_defined_type("hstore");
        assert_eq!(hstore.parsing_type(), "hstore");
        assert_eq!(hstore.canonical_type(), "varchar(max)");
        assert_eq!(hstore.composite_kind(), Some(CompositeKind::Map));

        let enum_without_signal = ColumnInfo::new("mood", "USER-DEFINED");
        assert_eq!(enum_without_signal.parsing_type(), "varchar");
        assert_eq!(enum_without_signal.canonical_type(), "varchar(255)");

        let custom = ColumnInfo::new("mood", "user-defined").with_user_defined_type("mood_enum");
        assert_eq!(custom.canonical_type(), "varchar");
    }

    #[test]
    fn test_array_element_types() {
        let ints = ColumnInfo::new("scores", "ARRAY").with_user_defined_type("_int4");
        assert_eq!(ints.parsing_type(), "array");
        assert_eq!(ints.canonical_type(), "varchar(max)");
        assert_eq!(ints.element_type(), WarehouseType::Integer);
        assert!(!ints.requires_quoting());

        let flags = ColumnInfo::new("flags", "ARRAY").with_user_defined_type("_bool");
        assert_eq!(flags.element_format(), ElementFormat::Boolean);

        let stamps = ColumnInfo::new("seen", "ARRAY").with_user_defined_type("_timestamp");
        assert!(stamps.requires_quoting());

        // No element signal means strings
        assert!(ColumnInfo::new("tags", "ARRAY").requires_quoting());
    }

    #[test]
    fn test_length_drives_canonical_type() {
        let column = ColumnInfo::new("code", "character").with_length(3);
        assert_eq!(column.canonical_type(), "char(3)");
        let column = ColumnInfo::new("body", "varchar").with_length(1_000_000);
        assert_eq!(column.canonical_type(), "varchar(65535)");
    }

    #[test]
    fn test_table_layout_drops_invalid_columns() {
        let layout = TableLayout::new(
            "users",
            vec![
                ColumnInfo::new("id", "integer"),
                ColumnInfo::new("", "text"),
                ColumnInfo::new("ghost", ""),
                ColumnInfo::new("email", "character varying").with_length(120),
            ],
        );

        assert_eq!(layout.column_names().collect::<Vec<_>>(), vec!["id", "email"]);
        assert_eq!(layout.schema.len(), 2);
        assert_eq!(layout.schema.get("id"), Some("integer"));
        assert_eq!(layout.schema.get("email"), Some("varchar(120)"));
        assert_eq!(layout.schema.get("ghost"), None);
        assert_eq!(layout.schema.get(""), None);
    }

    #[test]
    fn test_normalize_cell() {
        let tags = ColumnInfo::new("tags", "ARRAY").with_user_defined_type("_text");
        let set = ColumnInfo::new("perms", "set");
        let plain = ColumnInfo::new("name", "text");

        assert_eq!(
            normalize_cell(tags.composite_codec(), CellValue::Text("{a,b}".into())),
            json!(r#"["a","b"]"#)
        );
        assert_eq!(
            normalize_cell(set.composite_codec(), CellValue::Text("r,w".into())),
            json!(r#"["r","w"]"#)
        );
        assert_eq!(
            normalize_cell(plain.composite_codec(), CellValue::Text("{a,b}".into())),
            json!("{a,b}")
        );
        assert_eq!(normalize_cell(plain.composite_codec(), CellValue::Int(7)), json!(7));
        assert_eq!(normalize_cell(None, CellValue::Bool(true)), json!(true));
        assert_eq!(normalize_cell(None, CellValue::Float(1.5)), json!(1.5));
        assert_eq!(normalize_cell(None, CellValue::Float(f64::NAN)), json!("NaN"));
        assert_eq!(normalize_cell(tags.composite_codec(), CellValue::Null), JsonValue::Null);
    }

    #[test]
    fn test_event_from_row() {
        let layout = TableLayout::new(
            "accounts",
            vec![
                ColumnInfo::new("id", "bigint"),
                ColumnInfo::new("flags", "ARRAY").with_user_defined_type("_bool"),
            ],
        );
        let event = Event::from_row(
            &layout,
            vec![
                ("id".to_string(), CellValue::Int(9)),
                ("flags".to_string(), CellValue::Text("{t,f}".to_string())),
            ],
        );

        assert_eq!(event.table(), "accounts");
        assert_eq!(event.get("id"), Some(&json!(9)));
        assert_eq!(event.get("flags"), Some(&json!("[true,false]")));
        assert_eq!(
            layout.codec("flags"),
            Some(CompositeCodec {
                kind: CompositeKind::Array,
                format: ElementFormat::Boolean,
            })
        );
        assert_eq!(layout.codec("id"), None);
        assert!(Arc::ptr_eq(&layout.schema, &event.schema));

        let serialized = serde_json::to_value(&event).unwrap();
        assert_eq!(
            serialized,
            json!({
                "id": 9,
                "flags": "[true,false]",
                "_table_name": "accounts",
                "_table_schema": {"id": "bigint", "flags": "varchar(max)"}
            })
        );
    }

    #[test]
    fn test_metadata_keys_win_on_collision() {
        let layout = TableLayout::new("t", vec![ColumnInfo::new(TABLE_NAME_KEY, "text")]);
        let event = Event::from_row(
            &layout,
            vec![(TABLE_NAME_KEY.to_string(), CellValue::Text("shadow".into()))],
        );
        assert_eq!(event.get(TABLE_NAME_KEY), Some(&json!("shadow")));
        assert_eq!(event.to_json()[TABLE_NAME_KEY], json!("t"));
    }
}
