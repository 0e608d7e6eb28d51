//! Patient registration.

use std::sync::Arc;

use bioguard_core::error::DomainError;
use bioguard_core::model::Patient;

use crate::store::PatientStore;

/// Registers patients; validation and identifier assignment live at the
/// store boundary.
pub struct PatientService {
    patients: Arc<dyn PatientStore>,
}

impl PatientService {
    /// Builds the service over its store.
    pub fn new(patients: Arc<dyn PatientStore>) -> Self {
        Self { patients }
    }

    /// Registers a patient and returns the persisted (normalized) record.
    ///
    /// # Errors
    ///
    /// Propagates the store's `Validation`, `Conflict`, and `Persistence`
    /// errors unchanged.
    pub fn register(&self, patient: Patient) -> Result<Patient, DomainError> {
        self.patients.save(patient)
    }
}
