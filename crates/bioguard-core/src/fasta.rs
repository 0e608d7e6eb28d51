//! Text utilities for FASTA-framed messages.
//!
//! All three request dialects and both stored file formats share the same
//! physical shape: a `>`-prefixed header whose fields are separated by `|`,
//! optionally followed by a sequence line. These helpers normalize the raw
//! text once so parsers and stores agree on what a "line" and a "field" are.

use crate::error::DomainError;

/// Splits `text` on any line terminator, trims each line, and drops the
/// empty ones.
#[must_use]
pub fn lines(text: &str) -> Vec<String> {
    text.split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Parses a FASTA header line into its `|`-separated fields.
///
/// The line must start with `>` and split into exactly `expected_fields`
/// fields; each field is returned trimmed. `entity` names the dialect in the
/// error message so clients learn which rule they broke.
///
/// # Errors
///
/// Returns [`DomainError::InvalidFormat`] when the leading `>` is missing or
/// the field count does not match.
pub fn parse_header(
    first_line: &str,
    expected_fields: usize,
    entity: &str,
) -> Result<Vec<String>, DomainError> {
    let Some(rest) = first_line.strip_prefix('>') else {
        return Err(DomainError::InvalidFormat(format!(
            "Invalid FASTA format for {entity}"
        )));
    };
    let fields: Vec<String> = rest.split('|').map(|field| field.trim().to_owned()).collect();
    if fields.len() != expected_fields {
        return Err(DomainError::InvalidFormat(format!(
            "FASTA header for {entity} should have exactly {expected_fields} fields separated by '|'"
        )));
    }
    Ok(fields)
}

/// Returns the sequence line (second line) of a FASTA message, uppercased.
///
/// Malformed input (fewer than two non-empty lines) yields the empty string.
#[must_use]
pub fn sequence_of(fasta_text: &str) -> String {
    let lines = lines(fasta_text);
    lines.get(1).map(|line| line.to_uppercase()).unwrap_or_default()
}

/// Returns the trimmed text, or the empty string for blank input.
#[must_use]
pub fn trim_or_empty(value: &str) -> &str {
    value.trim()
}
