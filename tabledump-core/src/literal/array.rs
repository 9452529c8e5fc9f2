//! Multi-dimensional array literals (`{{1,2},{3,4}}`).
//!
//! Conversion runs in four passes over the text:
//! 1. braces inside quoted elements are masked with placeholders,
//! 2. every innermost `{…}` group is re-emitted with normalized elements,
//! 3. remaining braces become brackets,
//! 4. masked braces are restored.

use super::tokenizer::tokenize;
use super::ElementFormat;

const OPEN_BRACE_PLACEHOLDER: &str = "\u{0}lbrace\u{0}";
const CLOSE_BRACE_PLACEHOLDER: &str = "\u{0}rbrace\u{0}";

/// Converts an array literal into bracketed form.
///
/// # Example
/// ```rust
/// use tabledump_core::literal::{ElementFormat, parse_array};
///
/// assert_eq!(parse_array("{{1,2},{3,4}}", ElementFormat::Verbatim), "[[1,2],[3,4]]");
/// assert_eq!(parse_array("{a,b}", ElementFormat::Quoted), r#"["a","b"]"#);
/// ```
pub fn parse_array(source: &str, format: ElementFormat) -> String {
    let masked = mask_quoted_braces(source);
    let grouped = replace_innermost_groups(&masked, |content| {
        let elements = tokenize(content);
        format!("{{{}}}", format.render(&elements))
    });
    grouped
        .replace('{', "[")
        .replace('}', "]")
        .replace(OPEN_BRACE_PLACEHOLDER, "{")
        .replace(CLOSE_BRACE_PLACEHOLDER, "}")
}

/// Splits around quoted runs, so odd segments are the quoted contents.
///
/// A run opens at any quote outside a run and closes at the next quote that
/// is not part of a `\x` escape pair. An opening quote with no closing
/// quote is left in place as text.
fn split_on_unescaped_quotes(source: &str) -> Vec<&str> {
    let bytes = source.as_bytes();
    let mut segments = Vec::new();
    let mut segment_start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'"' {
            pos += 1;
            continue;
        }
        let Some(close) = closing_quote(bytes, pos + 1) else {
            break;
        };
        segments.push(&source[segment_start..pos]);
        segments.push(&source[pos + 1..close]);
        segment_start = close + 1;
        pos = close + 1;
    }
    segments.push(&source[segment_start..]);
    segments
}

/// Index of the quote closing a run whose content starts at `from`.
fn closing_quote(bytes: &[u8], from: usize) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => return Some(i),
            b'\\' => i += 2,
            _ => i += 1,
        }
    }
    None
}

fn mask_quoted_braces(source: &str) -> String {
    split_on_unescaped_quotes(source)
        .into_iter()
        .enumerate()
        .map(|(i, segment)| {
            if i % 2 == 1 {
                segment
                    .replace('{', OPEN_BRACE_PLACEHOLDER)
                    .replace('}', CLOSE_BRACE_PLACEHOLDER)
            } else {
                segment.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\"")
}

/// Applies `render` to the content of every non-empty `{…}` group that holds
/// no further braces. Groups are found left to right without overlap and
/// substituted in a single pass.
fn replace_innermost_groups(source: &str, mut render: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;

    while let Some(open) = rest.find('{') {
        let inner = &rest[open + 1..];
        match inner.find(['{', '}']) {
            Some(close) if close > 0 && inner.as_bytes()[close] == b'}' => {
                out.push_str(&rest[..open]);
                out.push_str(&render(&inner[..close]));
                rest = &inner[close + 1..];
            }
            Some(next) => {
                // Nested opening brace or an empty `{}`: resume at the next brace.
                out.push_str(&rest[..open + 1 + next]);
                rest = &inner[next..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}
