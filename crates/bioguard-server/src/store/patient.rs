//! Patient store: a single CSV table, unique by document.
//!
//! The file always starts with the canonical header; a missing or empty
//! file is recreated with it and an existing file without it gets the
//! header prepended. Rows that fail to parse are logged as corrupted and
//! skipped so the rest of the table stays readable.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use bioguard_core::error::DomainError;
use bioguard_core::fasta::trim_or_empty;
use bioguard_core::model::{Gender, Patient};
use parking_lot::Mutex;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use super::csv;

/// Canonical patient CSV header.
const FILE_HEADER: &str =
    "patientUuid,patientDocument,firstName,lastName,age,email,gender,city,country";

const MIN_PATIENT_AGE: i32 = 1;
const MAX_PATIENT_AGE: i32 = 120;
const MAX_DOCUMENT_LENGTH: usize = 20;
const EXPECTED_COLUMNS: usize = 9;

static DOCUMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").expect("valid regex"));

/// Letters (including Spanish accents) separated by single spaces.
static PERSON_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[A-Za-zÁÉÍÓÚáéíóúÑñÜü]+(?: [A-Za-zÁÉÍÓÚáéíóúÑñÜü]+)*$").expect("valid regex")
});

static LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[A-Za-zÁÉÍÓÚáéíóúÑñÜü]+(?: [A-Za-zÁÉÍÓÚáéíóúÑñÜü]+)*$").expect("valid regex")
});

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9+_.-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid regex")
});

/// Persistence seam for patients.
pub trait PatientStore: Send + Sync {
    /// Validates, normalizes, and appends a patient, assigning an
    /// identifier when absent. Returns the persisted record.
    ///
    /// # Errors
    ///
    /// [`DomainError::Validation`] for field violations,
    /// [`DomainError::Conflict`] for a duplicate document, and
    /// [`DomainError::Persistence`] for I/O failures.
    fn save(&self, patient: Patient) -> Result<Patient, DomainError>;

    /// Finds a patient by document via a linear scan; corrupt rows are
    /// skipped.
    ///
    /// # Errors
    ///
    /// [`DomainError::Persistence`] for I/O failures.
    fn get_by_document(&self, document: &str) -> Result<Option<Patient>, DomainError>;
}

/// CSV-backed [`PatientStore`].
pub struct CsvPatientStore {
    file_path: PathBuf,
    lock: Mutex<()>,
}

impl CsvPatientStore {
    /// Opens (and initializes) the patient CSV at `file_path`.
    ///
    /// # Errors
    ///
    /// [`DomainError::Persistence`] when the file cannot be prepared.
    pub fn new(file_path: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let store = Self {
            file_path: file_path.into(),
            lock: Mutex::new(()),
        };
        let created = store.initialize_file()?;
        if created {
            info!(path = %store.file_path.display(), "patient CSV created");
        } else {
            info!(path = %store.file_path.display(), "patient CSV ready");
        }
        Ok(store)
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Ensures the parent directory, the file, and its header exist.
    /// Returns whether the file was (re)created.
    fn initialize_file(&self) -> Result<bool, DomainError> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DomainError::persistence("Error al inicializar archivo CSV de pacientes", e)
                })?;
            }
        }
        let missing_or_empty = match std::fs::metadata(&self.file_path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };
        if missing_or_empty {
            std::fs::write(&self.file_path, format!("{FILE_HEADER}\n")).map_err(|e| {
                DomainError::persistence("Error al inicializar archivo CSV de pacientes", e)
            })?;
            return Ok(true);
        }
        let content = std::fs::read_to_string(&self.file_path).map_err(|e| {
            DomainError::persistence("Error al inicializar archivo CSV de pacientes", e)
        })?;
        if content.lines().next() != Some(FILE_HEADER) {
            let rewritten = format!("{FILE_HEADER}\n{content}");
            std::fs::write(&self.file_path, rewritten).map_err(|e| {
                DomainError::persistence("Error al inicializar archivo CSV de pacientes", e)
            })?;
        }
        Ok(false)
    }

    /// Reads every parseable row, logging and skipping corrupt ones.
    fn read_all(&self) -> Result<Vec<Patient>, DomainError> {
        let file = std::fs::File::open(&self.file_path)
            .map_err(|e| DomainError::persistence("Error al leer pacientes desde CSV", e))?;
        let reader = BufReader::new(file);
        let mut patients = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line =
                line.map_err(|e| DomainError::persistence("Error al leer pacientes desde CSV", e))?;
            if index == 0 || line.trim().is_empty() {
                continue;
            }
            match Self::map_row(&line, index as u64 + 1) {
                Ok(patient) => patients.push(patient),
                Err(DomainError::CorruptedData(message)) => {
                    warn!("[CorruptedData] {message}");
                }
                Err(other) => return Err(other),
            }
        }
        Ok(patients)
    }

    /// Maps one CSV row to a patient.
    fn map_row(line: &str, line_number: u64) -> Result<Patient, DomainError> {
        let columns = csv::parse_line(line);
        if columns.len() != EXPECTED_COLUMNS {
            return Err(DomainError::CorruptedData(format!(
                "Fila corrupta en CSV de pacientes: line={line_number} \
                 reason=Formato inválido: se esperaban exactamente {EXPECTED_COLUMNS} columnas \
                 y se encontraron {} raw='{line}'",
                columns.len()
            )));
        }
        let corrupt = || {
            DomainError::CorruptedData(format!(
                "Fila corrupta en CSV de pacientes: line={line_number} \
                 reason=Error al parsear/mapear valores de la fila raw='{line}'"
            ))
        };
        let uuid = Uuid::parse_str(columns[0].trim()).map_err(|_| corrupt())?;
        let age: i32 = columns[4].trim().parse().map_err(|_| corrupt())?;
        Ok(Patient {
            uuid: Some(uuid),
            document: columns[1].trim().to_owned(),
            first_name: columns[2].trim().to_owned(),
            last_name: columns[3].trim().to_owned(),
            age,
            email: columns[5].trim().to_owned(),
            gender: columns[6].trim().to_owned(),
            city: columns[7].trim().to_owned(),
            country: columns[8].trim().to_owned(),
        })
    }

    /// Validates and normalizes a patient prior to persistence.
    fn validate_for_persistence(patient: Patient) -> Result<Patient, DomainError> {
        let document = trim_or_empty(&patient.document).to_owned();
        let first_name = trim_or_empty(&patient.first_name).to_owned();
        let last_name = trim_or_empty(&patient.last_name).to_owned();
        let email = trim_or_empty(&patient.email).to_owned();
        let gender_raw = trim_or_empty(&patient.gender).to_owned();
        let city = trim_or_empty(&patient.city).to_owned();
        let country = trim_or_empty(&patient.country).to_owned();

        let mut invalid_fields = Vec::new();
        if document.is_empty() || !DOCUMENT_RE.is_match(&document) {
            invalid_fields.push("patientDocument".to_owned());
        } else if document.len() > MAX_DOCUMENT_LENGTH {
            invalid_fields.push(format!(
                "patientDocument (máximo {MAX_DOCUMENT_LENGTH} caracteres)"
            ));
        }
        if first_name.is_empty() || !PERSON_NAME_RE.is_match(&first_name) {
            invalid_fields.push("firstName".to_owned());
        }
        if last_name.is_empty() || !PERSON_NAME_RE.is_match(&last_name) {
            invalid_fields.push("lastName".to_owned());
        }
        if email.is_empty() || !EMAIL_RE.is_match(&email) {
            invalid_fields.push("email".to_owned());
        }
        let mut gender = None;
        if gender_raw.is_empty() {
            invalid_fields.push("gender".to_owned());
        } else {
            match Gender::from_value(&gender_raw) {
                Ok(parsed) => gender = Some(parsed),
                Err(_) => invalid_fields.push("gender".to_owned()),
            }
        }
        if city.is_empty() || !LOCATION_RE.is_match(&city) {
            invalid_fields.push("city".to_owned());
        }
        if country.is_empty() || !LOCATION_RE.is_match(&country) {
            invalid_fields.push("country".to_owned());
        }
        if patient.age < MIN_PATIENT_AGE || patient.age > MAX_PATIENT_AGE {
            invalid_fields.push("age".to_owned());
        }
        if !invalid_fields.is_empty() {
            return Err(DomainError::Validation(format!(
                "Campos inválidos: {}",
                invalid_fields.join(", ")
            )));
        }

        Ok(Patient {
            uuid: Some(patient.uuid.unwrap_or_else(Uuid::new_v4)),
            document,
            first_name,
            last_name,
            age: patient.age,
            email,
            gender: gender.map(Gender::as_str).unwrap_or_default().to_owned(),
            city,
            country,
        })
    }

    /// Serializes a patient into one sanitized CSV row.
    fn build_row(patient: &Patient) -> String {
        let uuid = patient.uuid.map(|u| u.to_string()).unwrap_or_default();
        let age = patient.age.to_string();
        let fields: [&str; 9] = [
            &uuid,
            &patient.document,
            &patient.first_name,
            &patient.last_name,
            &age,
            &patient.email,
            &patient.gender,
            &patient.city,
            &patient.country,
        ];
        fields
            .iter()
            .map(|value| csv::escape_field(&csv::sanitize_field(value)))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl PatientStore for CsvPatientStore {
    fn save(&self, patient: Patient) -> Result<Patient, DomainError> {
        let _guard = self.lock.lock();
        let patient = Self::validate_for_persistence(patient)?;
        self.initialize_file()?;
        let existing = self.read_all()?;
        if existing.iter().any(|p| p.document == patient.document) {
            return Err(DomainError::Conflict(format!(
                "Ya existe un paciente registrado con el documento: {}",
                patient.document
            )));
        }
        let row = Self::build_row(&patient);
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.file_path)
            .map_err(|e| DomainError::persistence("Error al guardar paciente en CSV", e))?;
        writeln!(file, "{row}")
            .map_err(|e| DomainError::persistence("Error al guardar paciente en CSV", e))?;
        Ok(patient)
    }

    fn get_by_document(&self, document: &str) -> Result<Option<Patient>, DomainError> {
        let _guard = self.lock.lock();
        let document = document.trim();
        if document.is_empty() {
            return Ok(None);
        }
        self.initialize_file()?;
        let patients = self.read_all()?;
        Ok(patients.into_iter().find(|p| p.document == document))
    }
}
