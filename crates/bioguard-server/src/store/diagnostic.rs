//! Diagnostic store: per-patient trees of samples and generated CSVs.
//!
//! Layout under the diagnostics root:
//!
//! ```text
//! <root>/<patient-id>/samples/<sampleHash>.fasta
//! <root>/<patient-id>/generated_diagnostics/<date>_<diagnostic-id>.csv
//! ```
//!
//! The sample file holds the canonical content `>document|date\nSEQUENCE`
//! and is named after its SHA-256 hash, which doubles as the duplicate
//! gate: sample creation uses exclusive-create semantics, so a retried
//! request fails cleanly with a conflict.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use bioguard_core::error::DomainError;
use bioguard_core::integrity;
use bioguard_core::model::Diagnostic;
use chrono::NaiveDate;
use parking_lot::Mutex;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

const SAMPLES_DIRECTORY_NAME: &str = "samples";
const GENERATED_DIAGNOSTICS_DIRECTORY_NAME: &str = "generated_diagnostics";
const FASTA_EXTENSION: &str = ".fasta";
const CSV_EXTENSION: &str = ".csv";
const MIN_DIAGNOSE_SEQUENCE_LENGTH: usize = 7;

/// Header of the per-diagnostic CSV.
const DIAGNOSTIC_FILE_HEADER: &str =
    "uuid_diagnostico,fecha,uuid_virus,virus,posicion_inicio,posicion_fin";

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));
static SEQUENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ACGT]+$").expect("valid regex"));
static DOCUMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").expect("valid regex"));

/// Builds the canonical sample content used for hashing and storage.
///
/// The date is part of the content so samples taken on different days hash
/// to different names.
#[must_use]
pub fn canonical_sample_content(document: &str, date: &str, sequence: &str) -> String {
    format!(">{document}|{date}\n{sequence}")
}

/// Persistence seam for diagnostics.
pub trait DiagnosticStore: Send + Sync {
    /// Persists the sample file and the generated per-diagnostic CSV.
    /// Returns the operation message appended to the response.
    ///
    /// # Errors
    ///
    /// [`DomainError::Validation`] for field violations,
    /// [`DomainError::Conflict`] when the sample file already exists, and
    /// [`DomainError::Persistence`] for I/O failures.
    fn save(&self, diagnostic: &Diagnostic) -> Result<String, DomainError>;

    /// Whether a sample with this canonical tuple already exists for the
    /// patient. A file that fails integrity verification counts as absent.
    ///
    /// # Errors
    ///
    /// [`DomainError::Persistence`] for I/O failures.
    fn exists_by_patient_and_sample(
        &self,
        patient_uuid: Uuid,
        sequence: &str,
        date: &str,
        document: &str,
    ) -> Result<bool, DomainError>;
}

/// Filesystem-backed [`DiagnosticStore`].
pub struct FsDiagnosticStore {
    diagnostics_directory: PathBuf,
    lock: Mutex<()>,
}

impl FsDiagnosticStore {
    /// Opens (and initializes) the diagnostics root.
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
            DomainError::persistence("Error al inicializar almacenamiento de diagnósticos", e)
        })?;
        info!(path = %store.diagnostics_directory.display(), "diagnostics directory ready");
        Ok(store)
    }

    /// Root directory owned by this store.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.diagnostics_directory
    }

    /// Validates the diagnostic before touching the filesystem.
    fn validate_for_save(diagnostic: &Diagnostic) -> Result<(), DomainError> {
        let mut invalid_fields = Vec::new();

        if diagnostic.patient.uuid.is_none() {
            invalid_fields.push("patient.uuid".to_owned());
        }
        let document = diagnostic.patient.document.trim();
        if document.is_empty() || !DOCUMENT_RE.is_match(document) {
            invalid_fields.push("patient.document".to_owned());
        }

        let date = diagnostic.sample_date.trim();
        if date.is_empty() || !DATE_RE.is_match(date) {
            invalid_fields.push("sampleDate".to_owned());
        } else if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
            invalid_fields.push("sampleDate".to_owned());
        }

        let sequence = diagnostic.sample_sequence.as_str();
        if sequence.trim().is_empty() || !SEQUENCE_RE.is_match(sequence) {
            invalid_fields.push("sampleSequence".to_owned());
        } else if sequence.len() < MIN_DIAGNOSE_SEQUENCE_LENGTH {
            invalid_fields.push(format!(
                "sampleSequence (mínimo {MIN_DIAGNOSE_SEQUENCE_LENGTH} nucleótidos)"
            ));
        }
        if diagnostic.diseases.is_empty() {
            invalid_fields.push("diseases".to_owned());
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

    /// Rows of the generated CSV: one per detected disease with the match
    /// positions of the patient sequence inside the disease sequence.
    fn build_csv_rows(diagnostic: &Diagnostic) -> Vec<String> {
        let mut rows = vec![DIAGNOSTIC_FILE_HEADER.to_owned()];
        let patient_sequence = diagnostic.sample_sequence.as_str();
        for disease in &diagnostic.diseases {
            let Some(disease_uuid) = disease.uuid else {
                continue;
            };
            let disease_sequence = disease.sequence.to_uppercase();
            let (start, end) = match disease_sequence.find(patient_sequence) {
                Some(start) => (start as i64, start as i64 + patient_sequence.len() as i64 - 1),
                None => (-1, -1),
            };
            rows.push(format!(
                "{},{},{},{},{start},{end}",
                diagnostic.uuid, diagnostic.sample_date, disease_uuid, disease.name
            ));
        }
        rows
    }
}

impl DiagnosticStore for FsDiagnosticStore {
    fn save(&self, diagnostic: &Diagnostic) -> Result<String, DomainError> {
        let _guard = self.lock.lock();
        Self::validate_for_save(diagnostic)?;

        let patient_uuid = diagnostic
            .patient
            .uuid
            .expect("validated: patient uuid present");
        let patient_directory = self.diagnostics_directory.join(patient_uuid.to_string());
        let samples_directory = patient_directory.join(SAMPLES_DIRECTORY_NAME);
        let generated_directory = patient_directory.join(GENERATED_DIAGNOSTICS_DIRECTORY_NAME);
        for directory in [&samples_directory, &generated_directory] {
            std::fs::create_dir_all(directory)
                .map_err(|e| DomainError::persistence("Error al guardar diagnóstico", e))?;
        }

        let canonical = canonical_sample_content(
            &diagnostic.patient.document,
            &diagnostic.sample_date,
            &diagnostic.sample_sequence,
        );
        let sample_hash = integrity::hash(&canonical);
        let sample_path = samples_directory.join(format!("{sample_hash}{FASTA_EXTENSION}"));
        if sample_path.exists() {
            return Err(DomainError::Conflict(
                "ya existe un diagnostico registrado para este paciente con la misma muestra y fecha"
                    .to_owned(),
            ));
        }
        let mut sample_file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&sample_path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => DomainError::Conflict(
                    "ya existe un diagnostico registrado para este paciente con la misma muestra y fecha"
                        .to_owned(),
                ),
                _ => DomainError::persistence("Error al guardar diagnóstico", e),
            })?;
        sample_file
            .write_all(canonical.as_bytes())
            .map_err(|e| DomainError::persistence("Error al guardar diagnóstico", e))?;

        let csv_name = format!(
            "{}_{}{CSV_EXTENSION}",
            diagnostic.sample_date, diagnostic.uuid
        );
        let csv_path = generated_directory.join(csv_name);
        let rows = Self::build_csv_rows(diagnostic);
        std::fs::write(&csv_path, format!("{}\n", rows.join("\n")))
            .map_err(|e| DomainError::persistence("Error al guardar diagnóstico", e))?;

        Ok(format!(
            "enfermedades_detectadas: {}",
            diagnostic.diseases.len()
        ))
    }

    fn exists_by_patient_and_sample(
        &self,
        patient_uuid: Uuid,
        sequence: &str,
        date: &str,
        document: &str,
    ) -> Result<bool, DomainError> {
        let _guard = self.lock.lock();
        if sequence.trim().is_empty() || date.trim().is_empty() || document.trim().is_empty() {
            return Ok(false);
        }
        let samples_directory = self
            .diagnostics_directory
            .join(patient_uuid.to_string())
            .join(SAMPLES_DIRECTORY_NAME);
        if !samples_directory.is_dir() {
            return Ok(false);
        }
        let canonical = canonical_sample_content(document, date, sequence);
        let sample_path = samples_directory.join(format!(
            "{}{FASTA_EXTENSION}",
            integrity::hash(&canonical)
        ));
        if !sample_path.is_file() {
            return Ok(false);
        }
        match integrity::verify_file(&sample_path, FASTA_EXTENSION) {
            Ok(()) => Ok(true),
            Err(DomainError::CorruptedData(message)) => {
                warn!("[CorruptedData] {message}");
                Ok(false)
            }
            Err(other) => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use bioguard_core::model::{Disease, Patient};

    use super::*;

    fn patient() -> Patient {
        Patient {
            uuid: Some(Uuid::new_v4()),
            document: "12345678".to_owned(),
            first_name: "Juan".to_owned(),
            last_name: "Perez".to_owned(),
            age: 30,
            email: "juan@mail.com".to_owned(),
            gender: "MASCULINO".to_owned(),
            city: "Bogota".to_owned(),
            country: "Colombia".to_owned(),
        }
    }

    fn diagnostic(sequence: &str) -> Diagnostic {
        Diagnostic {
            uuid: Uuid::new_v4(),
            sample_date: "2025-02-19".to_owned(),
            sample_sequence: sequence.to_owned(),
            patient: patient(),
            diseases: vec![Disease {
                uuid: Some(Uuid::new_v4()),
                name: "ebola".to_owned(),
                infectiousness: "ALTA".to_owned(),
                sequence: format!("{sequence}TAGATATATATTAGTAGTAGTAAAGTT"),
            }],
        }
    }

    fn store_in(dir: &tempfile::TempDir) -> FsDiagnosticStore {
        FsDiagnosticStore::new(dir.path().join("diagnostics")).unwrap()
    }

    #[test]
    fn save_writes_sample_and_generated_csv() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let diag = diagnostic("GAGTATGTGAA");
        let message = store.save(&diag).unwrap();
        assert_eq!(message, "enfermedades_detectadas: 1");

        let patient_dir = store.directory().join(diag.patient.uuid.unwrap().to_string());
        let canonical = canonical_sample_content("12345678", "2025-02-19", "GAGTATGTGAA");
        let sample_path = patient_dir
            .join("samples")
            .join(format!("{}.fasta", integrity::hash(&canonical)));
        assert_eq!(std::fs::read_to_string(&sample_path).unwrap(), canonical);

        let csv_path = patient_dir
            .join("generated_diagnostics")
            .join(format!("2025-02-19_{}.csv", diag.uuid));
        let content = std::fs::read_to_string(csv_path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some(DIAGNOSTIC_FILE_HEADER));
        let row = lines.next().unwrap();
        // Sequence matches at offset 0; inclusive end is |sequence| - 1.
        assert!(row.ends_with(",ebola,0,10"));
    }

    #[test]
    fn second_save_of_the_same_sample_is_a_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let diag = diagnostic("GAGTATGTGAA");
        store.save(&diag).unwrap();

        let mut retry = diag.clone();
        retry.uuid = Uuid::new_v4();
        let err = store.save(&retry).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn exists_checks_the_canonical_tuple() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let diag = diagnostic("GAGTATGTGAA");
        let patient_uuid = diag.patient.uuid.unwrap();
        assert!(!store
            .exists_by_patient_and_sample(patient_uuid, "GAGTATGTGAA", "2025-02-19", "12345678")
            .unwrap());

        store.save(&diag).unwrap();
        assert!(store
            .exists_by_patient_and_sample(patient_uuid, "GAGTATGTGAA", "2025-02-19", "12345678")
            .unwrap());
        // A different date is a different canonical tuple.
        assert!(!store
            .exists_by_patient_and_sample(patient_uuid, "GAGTATGTGAA", "2025-02-20", "12345678")
            .unwrap());
    }

    #[test]
    fn tampered_sample_counts_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let diag = diagnostic("GAGTATGTGAA");
        let patient_uuid = diag.patient.uuid.unwrap();
        store.save(&diag).unwrap();

        let canonical = canonical_sample_content("12345678", "2025-02-19", "GAGTATGTGAA");
        let sample_path = store
            .directory()
            .join(patient_uuid.to_string())
            .join("samples")
            .join(format!("{}.fasta", integrity::hash(&canonical)));
        std::fs::write(&sample_path, ">12345678|2025-02-19\nACGTACG").unwrap();

        assert!(!store
            .exists_by_patient_and_sample(patient_uuid, "GAGTATGTGAA", "2025-02-19", "12345678")
            .unwrap());
    }

    #[test]
    fn invalid_calendar_date_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut diag = diagnostic("GAGTATGTGAA");
        diag.sample_date = "2025-02-30".to_owned();
        let err = store.save(&diag).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("sampleDate")));
    }

    #[test]
    fn empty_disease_list_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut diag = diagnostic("GAGTATGTGAA");
        diag.diseases.clear();
        let err = store.save(&diag).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("diseases")));
    }
}
