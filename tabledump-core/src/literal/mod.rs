//! Composite literal re-encoding.
//!
//! Sources hand composite values over as text in their own syntax:
//! PostgreSQL arrays (`{a,"b c"}`), MySQL `SET` values (`a,b`) and
//! PostgreSQL `hstore` maps (`"k"=>"v"`). This module rewrites them into
//! JSON-like bracket and brace forms.
//!
//! Malformed literals (unbalanced quotes or braces) are not rejected. Their
//! output is unspecified and follows whatever the passes below produce.

mod array;
mod tokenizer;

pub use array::parse_array;
pub use tokenizer::tokenize;

use crate::type_mapping::WarehouseType;

/// Composite literal families, keyed by effective parsing type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeKind {
    /// PostgreSQL array (`array`)
    Array,
    /// MySQL set (`set`)
    Set,
    /// PostgreSQL hstore (`hstore`)
    Map,
}

impl CompositeKind {
    /// Returns the composite kind for a parsing type, if any.
    pub fn from_parsing_type(parsing_type: &str) -> Option<Self> {
        match parsing_type {
            "array" => Some(CompositeKind::Array),
            "set" => Some(CompositeKind::Set),
            "hstore" => Some(CompositeKind::Map),
            _ => None,
        }
    }
}

/// How elements of an innermost array group are written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementFormat {
    /// Wrap each element in double quotes (character and timestamp types)
    Quoted,
    /// Canonicalize boolean spellings to `true`/`false`
    Boolean,
    /// Emit elements unchanged
    Verbatim,
}

impl ElementFormat {
    /// Picks the element format for an array's element type.
    pub fn for_element_type(element_type: WarehouseType) -> Self {
        let rendered = element_type.to_string();
        if rendered.contains("char") || rendered.contains("timestamp") {
            ElementFormat::Quoted
        } else if element_type == WarehouseType::Boolean {
            ElementFormat::Boolean
        } else {
            ElementFormat::Verbatim
        }
    }

    fn render(self, elements: &[String]) -> String {
        match self {
            ElementFormat::Quoted => quote_elements(elements),
            ElementFormat::Boolean => elements
                .iter()
                .map(|e| match parse_bool(e) {
                    Some(b) => b.to_string(),
                    None => e.clone(),
                })
                .collect::<Vec<_>>()
                .join(","),
            ElementFormat::Verbatim => elements.join(","),
        }
    }
}

/// Accepts the same spellings as a strict boolean parser:
/// `1 t T TRUE true True` and `0 f F FALSE false False`.
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

fn quote_elements<S: AsRef<str>>(elements: &[S]) -> String {
    elements
        .iter()
        .map(|e| format!("\"{}\"", e.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Converts a MySQL `SET` value into a quoted list.
///
/// # Example
/// ```rust
/// use tabledump_core::literal::parse_set;
///
/// assert_eq!(parse_set("red,green"), r#"["red","green"]"#);
/// assert_eq!(parse_set(""), "[]");
/// ```
pub fn parse_set(source: &str) -> String {
    if source.is_empty() {
        return "[]".to_string();
    }
    let escaped = source.replace('"', "\\\"");
    let elements: Vec<&str> = escaped.split(',').collect();
    format!("[{}]", quote_elements(&elements))
}

/// Converts an `hstore` value into an object literal.
///
/// # Example
/// ```rust
/// use tabledump_core::literal::parse_map;
///
/// assert_eq!(parse_map(r#""a"=>"1""#), r#"{"a":"1"}"#);
/// assert_eq!(parse_map(""), "{}");
/// ```
pub fn parse_map(source: &str) -> String {
    format!("{{{}}}", source.replace("\"=>\"", "\":\""))
}

/// Re-encodes a composite literal of the given kind.
pub fn convert_literal(kind: CompositeKind, source: &str, format: ElementFormat) -> String {
    match kind {
        CompositeKind::Array => parse_array(source, format),
        CompositeKind::Set => parse_set(source),
        CompositeKind::Map => parse_map(source),
    }
}
