//! FASTA body parsers keyed by content type.
//!
//! Three dialects share the `application/fasta` content type:
//!
//! | Message  | Lines | Header fields (after `>`)                                    |
//! |----------|-------|--------------------------------------------------------------|
//! | Patient  | 1     | `document\|firstName\|lastName\|age\|email\|gender\|city\|country` |
//! | Disease  | 2     | `name\|level`, body line is the sequence                     |
//! | Diagnose | 2     | `document\|YYYY-MM-DD`, body line is the sequence            |
//!
//! Parsers check shape only: sequences are uppercased, text fields trimmed,
//! and `age` parsed as a signed integer, but domain ranges (age bounds,
//! sequence lengths, catalogs) belong to the store validators.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use bioguard_core::error::DomainError;
use bioguard_core::fasta;
use bioguard_core::model::{DiagnoseRequest, Disease, Patient};
use regex::Regex;

/// The one content type the three dialects share.
pub const FASTA_CONTENT_TYPE: &str = "application/fasta";

static DATE_FORMAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));

/// Mapping from content-type string to parser function.
///
/// Missing keys raise [`DomainError::InvalidFormat`] listing the supported
/// set, so a client sending the wrong content type learns what would have
/// been accepted.
pub struct ParserRegistry<T> {
    parsers: BTreeMap<String, fn(&str) -> Result<T, DomainError>>,
}

impl<T> Default for ParserRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ParserRegistry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parsers: BTreeMap::new(),
        }
    }

    /// Registers `parser` for `content_type`.
    pub fn register(&mut self, content_type: &str, parser: fn(&str) -> Result<T, DomainError>) {
        self.parsers.insert(content_type.to_owned(), parser);
    }

    /// Parses `body` with the parser registered for `content_type`.
    ///
    /// # Errors
    ///
    /// [`DomainError::InvalidFormat`] for an unknown content type or a body
    /// that violates the dialect.
    pub fn parse(&self, content_type: &str, body: &str) -> Result<T, DomainError> {
        let Some(parser) = self.parsers.get(content_type) else {
            let supported: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
            return Err(DomainError::InvalidFormat(format!(
                "Content-type no soportado: '{content_type}'. Content-types válidos: [{}]",
                supported.join(", ")
            )));
        };
        parser(body)
    }
}

/// Builds the registry for patient registration bodies.
#[must_use]
pub fn patient_registry() -> ParserRegistry<Patient> {
    let mut registry = ParserRegistry::new();
    registry.register(FASTA_CONTENT_TYPE, parse_patient);
    registry
}

/// Builds the registry for disease registration bodies.
#[must_use]
pub fn disease_registry() -> ParserRegistry<Disease> {
    let mut registry = ParserRegistry::new();
    registry.register(FASTA_CONTENT_TYPE, parse_disease);
    registry
}

/// Builds the registry for diagnose bodies.
#[must_use]
pub fn diagnose_registry() -> ParserRegistry<DiagnoseRequest> {
    let mut registry = ParserRegistry::new();
    registry.register(FASTA_CONTENT_TYPE, parse_diagnose);
    registry
}

/// Parses the one-line patient dialect.
///
/// # Errors
///
/// [`DomainError::InvalidFormat`] naming the violated rule.
pub fn parse_patient(body: &str) -> Result<Patient, DomainError> {
    let lines = checked_lines(body, 1, "Patient", "exactly 1 line")?;
    let fields = fasta::parse_header(&lines[0], 8, "Patient")?;
    let age: i32 = fields[3].parse().map_err(|_| {
        DomainError::InvalidFormat("Age field must be numeric".to_owned())
    })?;
    Ok(Patient {
        uuid: None,
        document: fields[0].clone(),
        first_name: fields[1].clone(),
        last_name: fields[2].clone(),
        age,
        email: fields[4].clone(),
        gender: fields[5].clone(),
        city: fields[6].clone(),
        country: fields[7].clone(),
    })
}

/// Parses the two-line disease dialect. The level stays raw; the catalog
/// check happens at the store boundary.
///
/// # Errors
///
/// [`DomainError::InvalidFormat`] naming the violated rule.
pub fn parse_disease(body: &str) -> Result<Disease, DomainError> {
    let lines = checked_lines(body, 2, "Disease", "exactly 2 lines")?;
    let fields = fasta::parse_header(&lines[0], 2, "Disease")?;
    Ok(Disease {
        uuid: None,
        name: fields[0].clone(),
        infectiousness: fields[1].clone(),
        sequence: lines[1].clone(),
    })
}

/// Parses the two-line diagnose dialect; the sequence is uppercased here so
/// the containment scan is case-stable.
///
/// # Errors
///
/// [`DomainError::InvalidFormat`] naming the violated rule.
pub fn parse_diagnose(body: &str) -> Result<DiagnoseRequest, DomainError> {
    let lines = checked_lines(body, 2, "Diagnose", "exactly 2 lines")?;
    let fields = fasta::parse_header(&lines[0], 2, "Diagnose")?;
    let sample_date = fields[1].clone();
    if !DATE_FORMAT_RE.is_match(&sample_date) {
        return Err(DomainError::InvalidFormat(
            "FASTA header for Diagnose requires a date in YYYY-MM-DD format as second field"
                .to_owned(),
        ));
    }
    Ok(DiagnoseRequest {
        document: fields[0].clone(),
        sample_date,
        sequence: lines[1].to_uppercase(),
    })
}

/// Shared shape checks: non-empty body, leading `>`, exact line count.
fn checked_lines(
    body: &str,
    expected: usize,
    entity: &str,
    line_rule: &str,
) -> Result<Vec<String>, DomainError> {
    if body.trim().is_empty() {
        return Err(DomainError::InvalidFormat(format!(
            "FASTA message for {entity} cannot be empty"
        )));
    }
    let lines = fasta::lines(body);
    if !lines.first().is_some_and(|line| line.starts_with('>')) {
        return Err(DomainError::InvalidFormat(format!(
            "Invalid FASTA format for {entity}"
        )));
    }
    if lines.len() != expected {
        return Err(DomainError::InvalidFormat(format!(
            "FASTA format for {entity} should have {line_rule}"
        )));
    }
    Ok(lines)
}
