//! CSV field handling shared by the tabular stores.

use std::sync::LazyLock;

use regex::Regex;

/// Control characters and CSV metacharacters that would corrupt a row.
static CONTROL_AND_CSV_SPECIAL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[\\r\\n\\t\\x0C\\x00-\\x1F\\x7F,\"]").expect("valid regex"));

/// Runs of two or more whitespace characters.
static MULTIPLE_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid regex"));

/// Sanitizes a value for safe inclusion in a CSV field: control characters
/// and CSV metacharacters become spaces, whitespace runs collapse to one
/// space, and the result is trimmed.
pub fn sanitize_field(value: &str) -> String {
    let clean = CONTROL_AND_CSV_SPECIAL_CHARS.replace_all(value, " ");
    MULTIPLE_SPACES.replace_all(&clean, " ").trim().to_owned()
}

/// Quotes a value when it contains a comma, quote, or line break, doubling
/// embedded quotes per the usual CSV rules.
pub fn escape_field(value: &str) -> String {
    let needs_quoting = value.contains(',')
        || value.contains('"')
        || value.contains('\n')
        || value.contains('\r');
    if needs_quoting {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

/// Parses one CSV line into its columns, honoring quoted values with
/// doubled-quote escapes.
pub fn parse_line(line: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                values.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    values.push(current);
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_metacharacters_and_collapses_spaces() {
        assert_eq!(sanitize_field("Juan,\"Perez\"\nBogota"), "Juan Perez Bogota");
        assert_eq!(sanitize_field("  a   b  "), "a b");
    }

    #[test]
    fn sanitize_strips_control_characters() {
        assert_eq!(sanitize_field("a\u{0}b\tc\u{7F}d"), "a b c d");
    }

    #[test]
    fn escape_quotes_only_when_needed() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn parse_line_handles_quoted_values() {
        assert_eq!(
            parse_line("a,\"b,c\",\"d\"\"e\""),
            vec!["a", "b,c", "d\"e"]
        );
    }

    #[test]
    fn parse_line_keeps_empty_columns() {
        assert_eq!(parse_line("a,,c"), vec!["a", "", "c"]);
    }

    #[test]
    fn escape_then_parse_roundtrips() {
        let raw = "virus-a|virus,b";
        let parsed = parse_line(&escape_field(raw));
        assert_eq!(parsed, vec![raw]);
    }
}
