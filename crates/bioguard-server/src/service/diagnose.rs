//! The diagnose pipeline.
//!
//! A diagnose request runs through a fixed sequence: field validation,
//! patient lookup, the duplicate-sample gate, the exact-containment scan
//! over the disease catalog, diagnostic construction, and three cascading
//! persistence effects in a fixed order (diagnosis save, high-infectivity
//! report, mutation history). Each effect returns a short message that,
//! when non-empty, joins the success response.

use std::sync::Arc;

use bioguard_core::error::DomainError;
use bioguard_core::model::{DiagnoseOutcome, DiagnoseRequest, Diagnostic, Disease};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;
use uuid::Uuid;

use crate::store::{
    DiagnosticStore, DiseaseStore, HighInfectivityReportStore, MutationHistoryStore, PatientStore,
};

const MIN_DIAGNOSE_SEQUENCE_LENGTH: usize = 7;
const MAX_DIAGNOSE_SEQUENCE_LENGTH: usize = 5000;
const MAX_DOCUMENT_LENGTH: usize = 20;

static DOCUMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").expect("valid regex"));
static SEQUENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ACGT]+$").expect("valid regex"));

/// Orchestrates the diagnose pipeline over the five stores.
pub struct DiagnoseService {
    patients: Arc<dyn PatientStore>,
    diseases: Arc<dyn DiseaseStore>,
    diagnostics: Arc<dyn DiagnosticStore>,
    reports: Arc<dyn HighInfectivityReportStore>,
    history: Arc<dyn MutationHistoryStore>,
}

impl DiagnoseService {
    /// Builds the service over its stores.
    pub fn new(
        patients: Arc<dyn PatientStore>,
        diseases: Arc<dyn DiseaseStore>,
        diagnostics: Arc<dyn DiagnosticStore>,
        reports: Arc<dyn HighInfectivityReportStore>,
        history: Arc<dyn MutationHistoryStore>,
    ) -> Self {
        Self {
            patients,
            diseases,
            diagnostics,
            reports,
            history,
        }
    }

    /// Runs the full pipeline for one diagnose request.
    ///
    /// # Errors
    ///
    /// - [`DomainError::Validation`] listing every offending field
    /// - [`DomainError::NotFound`] for an unknown patient or an empty match
    ///   list
    /// - [`DomainError::Conflict`] for a duplicate sample
    /// - [`DomainError::Persistence`] when any cascading effect fails
    pub fn diagnose(&self, request: &DiagnoseRequest) -> Result<DiagnoseOutcome, DomainError> {
        Self::validate_fields(request)?;

        let patient = self
            .patients
            .get_by_document(&request.document)?
            .ok_or_else(|| {
                DomainError::NotFound(
                    "no se encontró ningún paciente con dicho documento".to_owned(),
                )
            })?;
        let patient_uuid = patient.uuid.ok_or_else(|| {
            DomainError::NotFound(
                "no se encontró UUID para el paciente del documento enviado".to_owned(),
            )
        })?;

        if self.diagnostics.exists_by_patient_and_sample(
            patient_uuid,
            &request.sequence,
            &request.sample_date,
            &request.document,
        )? {
            return Err(DomainError::Conflict(
                "ya existe un diagnóstico registrado para este paciente con la misma muestra y fecha"
                    .to_owned(),
            ));
        }

        let catalog = self.diseases.find_all()?;
        let matches = find_matches(&request.sequence, &catalog);
        if matches.is_empty() {
            return Err(DomainError::NotFound(
                "no se encontró ninguna enfermedad que coincida con dicha secuencia".to_owned(),
            ));
        }

        let diagnostic = Diagnostic {
            uuid: Uuid::new_v4(),
            sample_date: request.sample_date.clone(),
            sample_sequence: request.sequence.clone(),
            patient,
            diseases: matches,
        };

        // The three persistence effects run in a fixed order; the sample
        // write must succeed before the report and the history run.
        let mut operation_messages = Vec::new();
        for message in [
            self.diagnostics.save(&diagnostic)?,
            self.reports.save(&diagnostic)?,
            self.history.save(&diagnostic)?,
        ] {
            if !message.trim().is_empty() {
                operation_messages.push(message);
            }
        }

        Ok(DiagnoseOutcome {
            diagnostic,
            operation_messages,
        })
    }

    /// Collects every field violation into one validation failure.
    fn validate_fields(request: &DiagnoseRequest) -> Result<(), DomainError> {
        let mut invalid_fields = Vec::new();
        if !DOCUMENT_RE.is_match(&request.document) {
            invalid_fields.push("patientDocument".to_owned());
        } else if request.document.len() > MAX_DOCUMENT_LENGTH {
            invalid_fields.push(format!(
                "patientDocument (máximo {MAX_DOCUMENT_LENGTH} caracteres)"
            ));
        }
        if NaiveDate::parse_from_str(&request.sample_date, "%Y-%m-%d").is_err() {
            invalid_fields.push("sampleDate".to_owned());
        }
        if !SEQUENCE_RE.is_match(&request.sequence) {
            invalid_fields.push("sampleSequence".to_owned());
        } else if request.sequence.len() < MIN_DIAGNOSE_SEQUENCE_LENGTH {
            invalid_fields.push(format!(
                "sampleSequence (mínimo {MIN_DIAGNOSE_SEQUENCE_LENGTH} nucleótidos)"
            ));
        } else if request.sequence.len() > MAX_DIAGNOSE_SEQUENCE_LENGTH {
            invalid_fields.push(format!(
                "sampleSequence (máximo {MAX_DIAGNOSE_SEQUENCE_LENGTH} nucleótidos)"
            ));
        }
        if invalid_fields.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(format!(
                "Campos inválidos: {}",
                invalid_fields.join(", ")
            )))
        }
    }
}

/// Scans the catalog for diseases whose sequence contains the patient
/// sequence as a contiguous substring, preserving scan order. Matches carry
/// the disease with its sequence normalized to upper case.
fn find_matches(patient_sequence: &str, catalog: &[Disease]) -> Vec<Disease> {
    let mut matches = Vec::new();
    for disease in catalog {
        if disease.sequence.trim().is_empty() {
            continue;
        }
        let disease_sequence = disease.sequence.to_uppercase();
        if disease_sequence.contains(patient_sequence) {
            matches.push(Disease {
                sequence: disease_sequence,
                ..disease.clone()
            });
        }
    }
    matches
}
