//! File-backed persistence stores.
//!
//! Each store exclusively owns its file or directory tree and guards it with
//! one process-wide mutex: every mutating operation and every read that must
//! observe a consistent view acquires the lock for the duration of the call.
//! Corrupt rows and corrupt files are logged and skipped so one bad record
//! never hides the rest.

mod csv;
pub mod diagnostic;
pub mod disease;
pub mod history;
pub mod patient;
pub mod report;

pub use diagnostic::{DiagnosticStore, FsDiagnosticStore};
pub use disease::{DiseaseStore, FastaDiseaseStore};
pub use history::{CsvMutationHistoryStore, MutationHistoryStore};
pub use patient::{CsvPatientStore, PatientStore};
pub use report::{CsvHighInfectivityReportStore, HighInfectivityReportStore};
