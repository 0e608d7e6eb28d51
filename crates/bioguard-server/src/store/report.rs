//! High-infectivity report store: one consolidated append-only CSV.
//!
//! A diagnosis qualifies when it detects at least three `ALTA`-level
//! diseases in a single pass; qualifying diagnoses append one row, the rest
//! write nothing. The header spelling (including `cantiad` and `altmanete`)
//! is part of the contract with external readers and must never be fixed.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use bioguard_core::error::DomainError;
use bioguard_core::model::Diagnostic;
use parking_lot::Mutex;
use tracing::info;

use super::csv;

const REPORT_FILE_NAME: &str = "high_infectivity_patients_report.csv";
const HIGH_INFECTIVITY_THRESHOLD: usize = 3;

/// Verbatim report header; the spelling is an external contract.
const REPORT_HEADER: &str = "documento,total_virus_detectados,\
cantiad_virus_altamente_infecciosos,lista_virus_contagio_normal_o_medio,\
lista_virus_altmanete_infecciosos";

/// Persistence seam for the high-infectivity report.
pub trait HighInfectivityReportStore: Send + Sync {
    /// Appends a report row when the diagnosis meets the threshold.
    /// Returns the operation message, or an empty string when the
    /// diagnosis does not qualify.
    ///
    /// # Errors
    ///
    /// [`DomainError::Validation`] when the diagnostic carries no usable
    /// patient document, [`DomainError::Persistence`] for I/O failures.
    fn save(&self, diagnostic: &Diagnostic) -> Result<String, DomainError>;
}

/// CSV-backed [`HighInfectivityReportStore`].
pub struct CsvHighInfectivityReportStore {
    report_file_path: PathBuf,
    lock: Mutex<()>,
}

impl CsvHighInfectivityReportStore {
    /// Opens (and initializes) the report file under `reports_directory`.
    ///
    /// # Errors
    ///
    /// [`DomainError::Persistence`] when the file cannot be prepared.
    pub fn new(reports_directory: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let store = Self {
            report_file_path: reports_directory.into().join(REPORT_FILE_NAME),
            lock: Mutex::new(()),
        };
        store.initialize_file()?;
        info!(path = %store.report_file_path.display(), "high-infectivity report ready");
        Ok(store)
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.report_file_path
    }

    /// Creates directories and restores the header when the file is
    /// missing or empty.
    fn initialize_file(&self) -> Result<(), DomainError> {
        if let Some(parent) = self.report_file_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DomainError::persistence("Error al inicializar reporte de alta infecciosidad", e)
            })?;
        }
        let missing_or_empty = match std::fs::metadata(&self.report_file_path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };
        if missing_or_empty {
            std::fs::write(&self.report_file_path, format!("{REPORT_HEADER}\n")).map_err(|e| {
                DomainError::persistence("Error al inicializar reporte de alta infecciosidad", e)
            })?;
        }
        Ok(())
    }
}

impl HighInfectivityReportStore for CsvHighInfectivityReportStore {
    fn save(&self, diagnostic: &Diagnostic) -> Result<String, DomainError> {
        let _guard = self.lock.lock();
        let document = diagnostic.patient.document.trim();
        if document.is_empty() {
            return Err(DomainError::Validation(
                "Diagnostic patient.document no puede ser vacío".to_owned(),
            ));
        }

        let named: Vec<_> = diagnostic
            .diseases
            .iter()
            .filter(|d| !d.name.trim().is_empty())
            .collect();
        if named.is_empty() {
            return Ok(String::new());
        }

        let mut high = Vec::new();
        let mut normal_or_medium = Vec::new();
        for disease in &named {
            let name = disease.name.trim().to_owned();
            if disease.is_highly_infectious() {
                high.push(name);
            } else {
                normal_or_medium.push(name);
            }
        }
        if high.len() < HIGH_INFECTIVITY_THRESHOLD {
            return Ok(String::new());
        }

        info!(
            document,
            high = high.len(),
            detected = named.len(),
            "high-infectivity criterion met"
        );

        self.initialize_file()?;
        let row = [
            document.to_owned(),
            named.len().to_string(),
            high.len().to_string(),
            normal_or_medium.join("|"),
            high.join("|"),
        ]
        .iter()
        .map(|value| csv::escape_field(value))
        .collect::<Vec<_>>()
        .join(",");
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.report_file_path)
            .map_err(|e| {
                DomainError::persistence("Error al guardar reporte de alta infecciosidad", e)
            })?;
        writeln!(file, "{row}").map_err(|e| {
            DomainError::persistence("Error al guardar reporte de alta infecciosidad", e)
        })?;

        Ok(format!(
            "criterio_alta_infecciosidad: cumple (>= {HIGH_INFECTIVITY_THRESHOLD})"
        ))
    }
}

#[cfg(test)]
mod tests {
    use bioguard_core::model::{Disease, Patient};
    use uuid::Uuid;

    use super::*;

    fn diagnostic(levels: &[&str]) -> Diagnostic {
        let diseases = levels
            .iter()
            .enumerate()
            .map(|(i, level)| Disease {
                uuid: Some(Uuid::new_v4()),
                name: format!("virus-{i}"),
                infectiousness: (*level).to_owned(),
                sequence: "ACGTACGTACGTACGT".to_owned(),
            })
            .collect();
        Diagnostic {
            uuid: Uuid::new_v4(),
            sample_date: "2025-03-01".to_owned(),
            sample_sequence: "ACGTACG".to_owned(),
            patient: Patient {
                uuid: Some(Uuid::new_v4()),
                document: "99887766".to_owned(),
                first_name: "Ana".to_owned(),
                last_name: "Gomez".to_owned(),
                age: 40,
                email: "ana@mail.com".to_owned(),
                gender: "FEMENINO".to_owned(),
                city: "Cali".to_owned(),
                country: "Colombia".to_owned(),
            },
            diseases,
        }
    }

    fn store_in(dir: &tempfile::TempDir) -> CsvHighInfectivityReportStore {
        CsvHighInfectivityReportStore::new(dir.path().join("reports")).unwrap()
    }

    #[test]
    fn header_is_written_verbatim_on_init() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let content = std::fs::read_to_string(store.path()).unwrap();
        assert!(content.starts_with("documento,total_virus_detectados,cantiad_virus"));
        assert!(content.contains("lista_virus_altmanete_infecciosos"));
    }

    #[test]
    fn three_high_level_diseases_append_one_row() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let message = store.save(&diagnostic(&["ALTA", "ALTA", "ALTA"])).unwrap();
        assert_eq!(message, "criterio_alta_infecciosidad: cumple (>= 3)");

        let content = std::fs::read_to_string(store.path()).unwrap();
        let rows: Vec<_> = content.lines().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], "99887766,3,3,,virus-0|virus-1|virus-2");
    }

    #[test]
    fn below_threshold_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let message = store.save(&diagnostic(&["ALTA", "ALTA", "MEDIA"])).unwrap();
        assert!(message.is_empty());

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn mixed_levels_split_into_the_two_lists() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .save(&diagnostic(&["ALTA", "BAJA", "ALTA", "MEDIA", "ALTA"]))
            .unwrap();
        let content = std::fs::read_to_string(store.path()).unwrap();
        let row = content.lines().nth(1).unwrap();
        assert_eq!(row, "99887766,5,3,virus-1|virus-3,virus-0|virus-2|virus-4");
    }

    #[test]
    fn header_is_restored_when_file_emptied() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "").unwrap();
        store.save(&diagnostic(&["ALTA", "ALTA", "ALTA"])).unwrap();
        let content = std::fs::read_to_string(store.path()).unwrap();
        assert!(content.starts_with(REPORT_HEADER));
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn blank_document_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut diag = diagnostic(&["ALTA", "ALTA", "ALTA"]);
        diag.patient.document = "  ".to_owned();
        assert!(matches!(
            store.save(&diag).unwrap_err(),
            DomainError::Validation(_)
        ));
    }
}
