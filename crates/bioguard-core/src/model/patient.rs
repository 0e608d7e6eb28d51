//! Patient entity and the gender catalog.

use uuid::Uuid;

use crate::error::DomainError;

/// Patient gender, restricted to the catalog's four values.
///
/// The external form of [`Gender::NoEspecificado`] uses a space
/// (`NO ESPECIFICADO`); the persisted form uses the underscore variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    /// External and stored form `MASCULINO`.
    Masculino,
    /// External and stored form `FEMENINO`.
    Femenino,
    /// External and stored form `OTRO`.
    Otro,
    /// External form `NO ESPECIFICADO`, stored as `NO_ESPECIFICADO`.
    NoEspecificado,
}

impl Gender {
    /// Parses a raw gender value, normalizing trim, case, and the
    /// space-vs-underscore divergence of the unspecified variant.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] for blank input or a value
    /// outside the catalog.
    pub fn from_value(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::Validation(
                "Gender no puede ser vacío".to_owned(),
            ));
        }
        let normalized = trimmed.replace(' ', "_").to_uppercase();
        match normalized.as_str() {
            "MASCULINO" => Ok(Self::Masculino),
            "FEMENINO" => Ok(Self::Femenino),
            "OTRO" => Ok(Self::Otro),
            "NO_ESPECIFICADO" => Ok(Self::NoEspecificado),
            _ => Err(DomainError::Validation(
                "Gender inválido. Valores permitidos: MASCULINO, FEMENINO, OTRO, NO ESPECIFICADO"
                    .to_owned(),
            )),
        }
    }

    /// The canonical form persisted in the patient CSV.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Masculino => "MASCULINO",
            Self::Femenino => "FEMENINO",
            Self::Otro => "OTRO",
            Self::NoEspecificado => "NO_ESPECIFICADO",
        }
    }
}

/// A patient record.
///
/// `uuid` is `None` until the store assigns an identifier at first
/// persistence. `gender` stays in its raw external form until the store
/// validates and normalizes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patient {
    /// Stable opaque identifier, assigned at first persistence.
    pub uuid: Option<Uuid>,
    /// Unique decimal-digit document, at most 20 characters.
    pub document: String,
    /// Given name, letters separated by single spaces.
    pub first_name: String,
    /// Family name, letters separated by single spaces.
    pub last_name: String,
    /// Age in years, within `[1, 120]`.
    pub age: i32,
    /// Contact email address.
    pub email: String,
    /// Gender in raw external form until store validation.
    pub gender: String,
    /// City of residence.
    pub city: String,
    /// Country of residence.
    pub country: String,
}
