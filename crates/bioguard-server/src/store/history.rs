//! Mutation-history store: one CSV per diagnosis with change segments
//! against every prior sample of the patient.
//!
//! For each prior sample (everything in the patient's `samples/` directory
//! except the sample just written), the store verifies integrity, extracts
//! the previous date and sequence from the stored FASTA, computes the
//! change segments, and writes them sorted ascending by previous date into
//! `<root>/<patient-id>/history/<date>_<diagnostic-id>.csv`. Corrupt prior
//! samples are logged and skipped; one bad file never hides the rest.

use std::path::PathBuf;

use bioguard_core::error::DomainError;
use bioguard_core::integrity;
use bioguard_core::model::Diagnostic;
use bioguard_core::mutation::change_segments;
use bioguard_core::{fasta, mutation};
use chrono::NaiveDate;
use parking_lot::Mutex;
use tracing::{info, warn};

use super::diagnostic::canonical_sample_content;

const SAMPLES_DIRECTORY_NAME: &str = "samples";
const HISTORY_DIRECTORY_NAME: &str = "history";
const FASTA_EXTENSION: &str = ".fasta";
const CSV_EXTENSION: &str = ".csv";

/// Header of the per-diagnosis history CSV.
const HISTORY_HEADER: &str =
    "fecha_muestra,posicion_inicio_cambio,posicion_inicio_fin_cambio,tipo_cambio";

/// Persistence seam for the mutation history.
pub trait MutationHistoryStore: Send + Sync {
    /// Writes the history CSV for this diagnosis. Returns
    /// `historial_muestras: actualizado` when at least one prior sample was
    /// processed, or an empty string otherwise.
    ///
    /// # Errors
    ///
    /// [`DomainError::Validation`] for an incomplete diagnostic,
    /// [`DomainError::Persistence`] for I/O failures.
    fn save(&self, diagnostic: &Diagnostic) -> Result<String, DomainError>;
}

/// CSV-backed [`MutationHistoryStore`] sharing the diagnostics root.
pub struct CsvMutationHistoryStore {
    diagnostics_directory: PathBuf,
    lock: Mutex<()>,
}

/// One history row prior to date-sorting.
struct HistoryRow {
    previous_date: String,
    start: i64,
    end: i64,
    kind: mutation::ChangeKind,
}

impl CsvMutationHistoryStore {
    /// Opens (and initializes) the history store over the diagnostics root.
    ///
    /// # Errors
    ///
    /// [`DomainError::Persistence`] when the root cannot be prepared.
    pub fn new(diagnostics_directory: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let store = Self {
            diagnostics_directory: diagnostics_directory.into(),
            lock: Mutex::new(()),
        };
        std::fs::create_dir_all(&store.diagnostics_directory).map_err(|e| {
            DomainError::persistence(
                "Error al inicializar directorio de historial de diagnósticos",
                e,
            )
        })?;
        Ok(store)
    }

    /// Validates the fields the history generation depends on.
    fn validate(diagnostic: &Diagnostic) -> Result<(), DomainError> {
        if diagnostic.sample_date.trim().is_empty() {
            return Err(DomainError::Validation(
                "Diagnostic sampleDate no puede ser vacío".to_owned(),
            ));
        }
        if diagnostic.sample_sequence.trim().is_empty() {
            return Err(DomainError::Validation(
                "Diagnostic sampleSequence no puede ser vacío".to_owned(),
            ));
        }
        if diagnostic.patient.uuid.is_none() {
            return Err(DomainError::Validation(
                "Diagnostic patient.uuid no puede ser null".to_owned(),
            ));
        }
        Ok(())
    }

    /// Name-sorted `.fasta` sample files of the patient.
    fn list_sample_files(samples_directory: &std::path::Path) -> Result<Vec<PathBuf>, DomainError> {
        if !samples_directory.is_dir() {
            return Ok(Vec::new());
        }
        let entries = std::fs::read_dir(samples_directory).map_err(|e| {
            DomainError::persistence("Error al guardar historial de diagnóstico del paciente", e)
        })?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                DomainError::persistence(
                    "Error al guardar historial de diagnóstico del paciente",
                    e,
                )
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if entry
                .file_name()
                .to_string_lossy()
                .to_lowercase()
                .ends_with(FASTA_EXTENSION)
            {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Whether this sample file is the one just written for the current
    /// diagnosis, identified by its canonical hash.
    fn is_current_sample(path: &std::path::Path, current_hash: &str) -> bool {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        name.strip_suffix(FASTA_EXTENSION)
            .is_some_and(|hash| hash == current_hash)
    }

    /// Extracts the previous sample date from a stored FASTA header
    /// (`>document|date`), or the empty string when absent.
    fn date_from_fasta(content: &str) -> String {
        let lines = fasta::lines(content);
        let Some(header) = lines.first() else {
            return String::new();
        };
        let Some(rest) = header.strip_prefix('>') else {
            return String::new();
        };
        let fields: Vec<&str> = rest.split('|').collect();
        if fields.len() < 2 {
            return String::new();
        }
        fields[1].trim().to_owned()
    }

    /// Dates sort ascending; blank or unparseable dates sort last.
    fn sort_key(date: &str) -> NaiveDate {
        let trimmed = date.trim();
        if trimmed.is_empty() {
            return NaiveDate::MAX;
        }
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").unwrap_or(NaiveDate::MAX)
    }
}

impl MutationHistoryStore for CsvMutationHistoryStore {
    fn save(&self, diagnostic: &Diagnostic) -> Result<String, DomainError> {
        let _guard = self.lock.lock();
        Self::validate(diagnostic)?;

        let patient_uuid = diagnostic
            .patient
            .uuid
            .expect("validated: patient uuid present");
        let patient_directory = self.diagnostics_directory.join(patient_uuid.to_string());
        let samples_directory = patient_directory.join(SAMPLES_DIRECTORY_NAME);
        let history_directory = patient_directory.join(HISTORY_DIRECTORY_NAME);
        std::fs::create_dir_all(&history_directory).map_err(|e| {
            DomainError::persistence("Error al guardar historial de diagnóstico del paciente", e)
        })?;

        let current_sequence = diagnostic.sample_sequence.as_str();
        let current_hash = integrity::hash(&canonical_sample_content(
            &diagnostic.patient.document,
            &diagnostic.sample_date,
            current_sequence,
        ));

        let mut rows: Vec<HistoryRow> = Vec::new();
        let mut previous_samples = 0usize;
        for sample_path in Self::list_sample_files(&samples_directory)? {
            if Self::is_current_sample(&sample_path, &current_hash) {
                continue;
            }
            if let Err(DomainError::CorruptedData(message)) =
                integrity::verify_file(&sample_path, FASTA_EXTENSION)
            {
                warn!("[CorruptedData] {message}");
                continue;
            }
            previous_samples += 1;

            let Ok(content) = std::fs::read_to_string(&sample_path) else {
                continue;
            };
            let content = content.trim();
            if content.is_empty() {
                continue;
            }
            let (previous_date, previous_sequence) = if content.starts_with('>') {
                (Self::date_from_fasta(content), fasta::sequence_of(content))
            } else {
                (String::new(), content.to_uppercase())
            };
            for segment in change_segments(current_sequence, &previous_sequence) {
                rows.push(HistoryRow {
                    previous_date: previous_date.clone(),
                    start: segment.start,
                    end: segment.end,
                    kind: segment.kind,
                });
            }
        }

        rows.sort_by_key(|row| Self::sort_key(&row.previous_date));

        let mut lines = vec![HISTORY_HEADER.to_owned()];
        for row in &rows {
            lines.push(format!(
                "{},{},{},{}",
                row.previous_date,
                row.start,
                row.end,
                row.kind.as_str()
            ));
        }
        let history_path = history_directory.join(format!(
            "{}_{}{CSV_EXTENSION}",
            diagnostic.sample_date, diagnostic.uuid
        ));
        std::fs::write(&history_path, format!("{}\n", lines.join("\n"))).map_err(|e| {
            DomainError::persistence("Error al guardar historial de diagnóstico del paciente", e)
        })?;

        if previous_samples > 0 {
            info!(patient = %patient_uuid, previous_samples, "mutation history updated");
            Ok("historial_muestras: actualizado".to_owned())
        } else {
            Ok(String::new())
        }
    }
}
