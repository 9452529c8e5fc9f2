//! Single-pass scanner for comma-separated array element lists.
//!
//! Grammar (one token per match, scanned left to right):
//!
//! ```text
//! element  := (unquoted | quoted) ","?
//! unquoted := [^",\\{}\s]+          -- a run equal to NULL yields nothing
//! quoted   := '"' ( [^"\\] | '\"' | '\\' )* '"'
//! ```
//!
//! Characters that cannot start an element are skipped one at a time, which
//! is also how an unterminated quote is handled. Surrounding quotes are
//! stripped from emitted tokens; escape sequences are kept verbatim.

/// Unquoted run that stands for SQL NULL and is dropped.
const NULL_LITERAL: &str = "NULL";

/// Whitespace as understood by the element grammar (`\t \n \f \r` and space).
fn is_separator_whitespace(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | 0x0C | b'\r' | b' ')
}

fn is_unquoted_byte(b: u8) -> bool {
    !matches!(b, b'"' | b',' | b'\\' | b'{' | b'}') && !is_separator_whitespace(b)
}

/// Returns the index just past the closing quote of a quoted element that
/// opens at `start`, or `None` when the element is not properly closed.
fn quoted_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => return Some(i + 1),
            b'\\' => match bytes.get(i + 1) {
                Some(b'"') | Some(b'\\') => i += 2,
                _ => return None,
            },
            _ => i += 1,
        }
    }
    None
}

fn skip_separator(bytes: &[u8], pos: usize) -> usize {
    if bytes.get(pos) == Some(&b',') {
        pos + 1
    } else {
        pos
    }
}

/// Splits an array element list into tokens.
///
/// # Example
/// ```rust
/// use tabledump_core::literal::tokenize;
///
/// assert_eq!(tokenize(r#"a, "b,c",NULL,d"#), vec!["a", "b,c", "d"]);
/// ```
pub fn tokenize(input: &str) -> Vec<String> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    // Delimiters are all ASCII, so every slice boundary below falls on a
    // UTF-8 character boundary.
    while pos < bytes.len() {
        let b = bytes[pos];
        if is_unquoted_byte(b) {
            let start = pos;
            while pos < bytes.len() && is_unquoted_byte(bytes[pos]) {
                pos += 1;
            }
            let run = &input[start..pos];
            if run != NULL_LITERAL {
                tokens.push(run.to_string());
            }
            pos = skip_separator(bytes, pos);
        } else if b == b'"' {
            match quoted_end(bytes, pos) {
                Some(end) => {
                    // Strip exactly the delimiting quotes so a trailing
                    // escaped quote stays part of the value.
                    tokens.push(input[pos + 1..end - 1].to_string());
                    pos = skip_separator(bytes, end);
                }
                None => pos += 1,
            }
        } else {
            pos += 1;
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquoted_tokens() {
        assert_eq!(tokenize("a,b,c"), vec!["a", "b", "c"]);
        assert_eq!(tokenize("a, b,c"), vec!["a", "b", "c"]);
        assert_eq!(tokenize("1.5,-2,3e4"), vec!["1.5", "-2", "3e4"]);
    }

    #[test]
    fn test_quoted_tokens_keep_escapes() {
        assert_eq!(tokenize(r#""a b",c"#), vec!["a b", "c"]);
        assert_eq!(tokenize(r#""say \"hi\"",x"#), vec![r#"say \"hi\""#, "x"]);
        assert_eq!(tokenize(r#""back\\slash""#), vec![r"back\\slash"]);
        assert_eq!(tokenize(r#""a,b""#), vec!["a,b"]);
        assert_eq!(tokenize(r#""ends with \"""#), vec![r#"ends with \""#]);
    }

    #[test]
    fn test_null_literal_is_dropped() {
        assert_eq!(tokenize("1,NULL,3"), vec!["1", "3"]);
        assert_eq!(tokenize(r#""NULL""#), vec!["NULL"]);
        assert_eq!(tokenize("NULLABLE"), vec!["NULLABLE"]);
    }

    #[test]
    fn test_empty_quoted_token() {
        assert_eq!(tokenize(r#""",a"#), vec!["", "a"]);
    }

    #[test]
    fn test_unterminated_quote_is_skipped() {
        assert_eq!(tokenize(r#""abc"#), vec!["abc"]);
        assert_eq!(tokenize(r#""a\x",b"#), vec!["a", "x", "b"]);
    }

    #[test]
    fn test_multibyte_characters() {
        assert_eq!(tokenize("żółw,\"日本 語\""), vec!["żółw", "日本 語"]);
    }

    #[test]
    fn test_blank_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("  ,  ").is_empty());
    }
}
