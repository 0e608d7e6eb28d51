//! Dependency wiring: configuration to a ready-to-dispatch router.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::{
    self, ServerConfig, DIAGNOSTICS_DIRECTORY, DISEASES_DIRECTORY, PATIENTS_CSV_PATH,
    REPORTS_DIRECTORY,
};
use crate::protocol::{
    parse, DiagnoseController, DiseaseRegisterController, PatientRegisterController, Router,
};
use crate::service::{DiagnoseService, DiseaseService, PatientService};
use crate::store::{
    CsvHighInfectivityReportStore, CsvMutationHistoryStore, CsvPatientStore, FastaDiseaseStore,
    FsDiagnosticStore,
};

/// Storage locations for the five stores.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    /// Patient CSV file.
    pub patients_csv: std::path::PathBuf,
    /// Disease FASTA directory.
    pub diseases_directory: std::path::PathBuf,
    /// Diagnostics root (per-patient trees).
    pub diagnostics_directory: std::path::PathBuf,
    /// High-infectivity report directory.
    pub reports_directory: std::path::PathBuf,
}

impl StoragePaths {
    /// Resolves the storage paths from configuration, failing fast on any
    /// missing key.
    ///
    /// # Errors
    ///
    /// Propagates [`config::ConfigError`] for missing or blank keys.
    pub fn from_config(config: &ServerConfig) -> Result<Self, config::ConfigError> {
        Ok(Self {
            patients_csv: config.require(PATIENTS_CSV_PATH)?.into(),
            diseases_directory: config.require(DISEASES_DIRECTORY)?.into(),
            diagnostics_directory: config.require(DIAGNOSTICS_DIRECTORY)?.into(),
            reports_directory: config.require(REPORTS_DIRECTORY)?.into(),
        })
    }

    /// Convenience constructor rooting every store under one directory;
    /// used by tests and local runs.
    #[must_use]
    pub fn under_root(root: &Path) -> Self {
        Self {
            patients_csv: root.join("patients.csv"),
            diseases_directory: root.join("diseases"),
            diagnostics_directory: root.join("diagnostics"),
            reports_directory: root.join("reports"),
        }
    }
}

/// Builds the stores, services, controllers, and routing table.
///
/// # Errors
///
/// Fails when any store cannot initialize its backing file or directory.
pub fn build_router(paths: &StoragePaths) -> Result<Arc<Router>> {
    let patients = Arc::new(
        CsvPatientStore::new(&paths.patients_csv).context("failed to initialize patient store")?,
    );
    let diseases = Arc::new(
        FastaDiseaseStore::new(&paths.diseases_directory)
            .context("failed to initialize disease store")?,
    );
    let diagnostics = Arc::new(
        FsDiagnosticStore::new(&paths.diagnostics_directory)
            .context("failed to initialize diagnostic store")?,
    );
    let reports = Arc::new(
        CsvHighInfectivityReportStore::new(&paths.reports_directory)
            .context("failed to initialize high-infectivity report store")?,
    );
    let history = Arc::new(
        CsvMutationHistoryStore::new(&paths.diagnostics_directory)
            .context("failed to initialize mutation-history store")?,
    );

    let patient_service = Arc::new(PatientService::new(patients.clone()));
    let disease_service = Arc::new(DiseaseService::new(diseases.clone()));
    let diagnose_service = Arc::new(DiagnoseService::new(
        patients,
        diseases,
        diagnostics,
        reports,
        history,
    ));

    let mut router = Router::new();
    router.register(
        "POST",
        "patient",
        Arc::new(PatientRegisterController::new(
            patient_service,
            parse::patient_registry(),
        )),
    );
    router.register(
        "POST",
        "disease",
        Arc::new(DiseaseRegisterController::new(
            disease_service,
            parse::disease_registry(),
        )),
    );
    router.register(
        "POST",
        "diagnose",
        Arc::new(DiagnoseController::new(
            diagnose_service,
            parse::diagnose_registry(),
        )),
    );
    Ok(Arc::new(router))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_paths_resolve_from_configuration() {
        let config = ServerConfig::from_str_content(
            "storage.csv.patients.path = data/patients.csv\n\
             storage.diseases.directory = data/diseases\n\
             storage.diagnostics.directory = data/diagnostics\n\
             storage.reports.high_infectiousness.directory = data/reports\n",
        );
        let paths = StoragePaths::from_config(&config).unwrap();
        assert_eq!(paths.patients_csv, Path::new("data/patients.csv"));
        assert_eq!(paths.reports_directory, Path::new("data/reports"));
    }

    #[test]
    fn missing_storage_key_aborts_assembly() {
        let config = ServerConfig::from_str_content("storage.csv.patients.path = data/p.csv\n");
        let err = StoragePaths::from_config(&config).unwrap_err();
        assert!(matches!(err, config::ConfigError::MissingKey { .. }));
    }

    #[test]
    fn build_router_initializes_every_store() {
        let root = tempfile::tempdir().unwrap();
        let paths = StoragePaths::under_root(root.path());
        build_router(&paths).unwrap();

        assert!(paths.patients_csv.is_file());
        assert!(paths.diseases_directory.is_dir());
        assert!(paths.diagnostics_directory.is_dir());
        assert!(paths
            .reports_directory
            .join("high_infectivity_patients_report.csv")
            .is_file());
    }
}
