//! Disease entity and the infectiousness catalog.

use uuid::Uuid;

use crate::error::DomainError;

/// Infectiousness level of a disease.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfectiousnessLevel {
    /// Highly infectious; drives the high-infectivity report.
    Alta,
    /// Medium infectiousness.
    Media,
    /// Low infectiousness.
    Baja,
}

impl InfectiousnessLevel {
    /// Parses a raw level value after trim and case normalization.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Validation`] for a value outside the catalog.
    pub fn from_value(raw: &str) -> Result<Self, DomainError> {
        match raw.trim().to_uppercase().as_str() {
            "ALTA" => Ok(Self::Alta),
            "MEDIA" => Ok(Self::Media),
            "BAJA" => Ok(Self::Baja),
            _ => Err(DomainError::Validation(
                "Infectiousness inválido. Valores permitidos: ALTA, MEDIA, BAJA".to_owned(),
            )),
        }
    }

    /// The canonical uppercase form used in headers and file content.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alta => "ALTA",
            Self::Media => "MEDIA",
            Self::Baja => "BAJA",
        }
    }
}

/// A registered disease.
///
/// `uuid` is `None` until the store assigns an identifier at first
/// persistence. `infectiousness` stays in its raw form until the store
/// validates it against the catalog; stored diseases always carry the
/// canonical uppercase form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disease {
    /// Opaque identifier, assigned at first persistence.
    pub uuid: Option<Uuid>,
    /// Disease name.
    pub name: String,
    /// Infectiousness level (`ALTA`, `MEDIA`, or `BAJA`).
    pub infectiousness: String,
    /// Genetic sequence over the `{A, C, G, T}` alphabet, length >= 15.
    pub sequence: String,
}

impl Disease {
    /// Whether this disease carries the `ALTA` infectiousness level.
    ///
    /// A level that fails to parse (possible only for values built outside
    /// the store validation path) counts as not-high.
    #[must_use]
    pub fn is_highly_infectious(&self) -> bool {
        InfectiousnessLevel::from_value(&self.infectiousness)
            .is_ok_and(|level| level == InfectiousnessLevel::Alta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parsing_normalizes_trim_and_case() {
        assert_eq!(
            InfectiousnessLevel::from_value(" alta ").unwrap(),
            InfectiousnessLevel::Alta
        );
        assert_eq!(
            InfectiousnessLevel::from_value("MEDIA").unwrap(),
            InfectiousnessLevel::Media
        );
    }

    #[test]
    fn unknown_level_is_rejected() {
        assert!(InfectiousnessLevel::from_value("EXTREMA").is_err());
    }

    #[test]
    fn high_infectiousness_check_reads_the_raw_level() {
        let disease = Disease {
            uuid: None,
            name: "ebola".to_owned(),
            infectiousness: "ALTA".to_owned(),
            sequence: "GAGTATGTGAATAGA".to_owned(),
        };
        assert!(disease.is_highly_infectious());

        let mild = Disease {
            infectiousness: "BAJA".to_owned(),
            ..disease
        };
        assert!(!mild.is_highly_infectious());
    }
}
