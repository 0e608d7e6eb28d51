//! Disease registration.

use std::sync::Arc;

use bioguard_core::error::DomainError;
use bioguard_core::model::Disease;

use crate::store::DiseaseStore;

/// Registers diseases; validation and identifier assignment live at the
/// store boundary.
pub struct DiseaseService {
    diseases: Arc<dyn DiseaseStore>,
}

impl DiseaseService {
    /// Builds the service over its store.
    pub fn new(diseases: Arc<dyn DiseaseStore>) -> Self {
        Self { diseases }
    }

    /// Registers a disease and returns the persisted (normalized) record.
    ///
    /// # Errors
    ///
    /// Propagates the store's `Validation`, `Conflict`, and `Persistence`
    /// errors unchanged.
    pub fn register(&self, disease: Disease) -> Result<Disease, DomainError> {
        self.diseases.save(disease)
    }
}
