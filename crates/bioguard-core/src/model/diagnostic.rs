//! Diagnostic entity and the diagnose request/outcome records.

use uuid::Uuid;

use super::{Disease, Patient};

/// A materialized diagnostic: a patient sample matched against the disease
/// catalog.
///
/// Diagnostics are only constructed after validation succeeded and at least
/// one disease matched; the detected list preserves catalog scan order.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Opaque identifier assigned at creation.
    pub uuid: Uuid,
    /// Sample date in `YYYY-MM-DD` form.
    pub sample_date: String,
    /// Patient sample sequence, uppercased, `7..=5000` bases.
    pub sample_sequence: String,
    /// The diagnosed patient.
    pub patient: Patient,
    /// Detected diseases in scan order; never empty once materialized.
    pub diseases: Vec<Disease>,
}

/// Parsed diagnose request, straight out of the FASTA body parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnoseRequest {
    /// Patient document as submitted.
    pub document: String,
    /// Sample date in `YYYY-MM-DD` form.
    pub sample_date: String,
    /// Sample sequence, uppercased by the parser.
    pub sequence: String,
}

/// Result of the diagnose pipeline: the diagnostic plus the non-empty
/// operation messages produced by the cascading persistence effects.
#[derive(Debug, Clone)]
pub struct DiagnoseOutcome {
    /// The materialized diagnostic.
    pub diagnostic: Diagnostic,
    /// Secondary-effect messages, joined into the success response.
    pub operation_messages: Vec<String>,
}
