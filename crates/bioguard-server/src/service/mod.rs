//! Business rules: registration flows and the diagnose pipeline.

mod diagnose;
mod disease;
mod patient;

pub use diagnose::DiagnoseService;
pub use disease::DiseaseService;
pub use patient::PatientService;
