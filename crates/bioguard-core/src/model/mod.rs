//! Domain entities: patients, diseases, diagnostics.

mod diagnostic;
mod disease;
mod patient;

pub use diagnostic::{DiagnoseOutcome, DiagnoseRequest, Diagnostic};
pub use disease::{Disease, InfectiousnessLevel};
pub use patient::{Gender, Patient};
