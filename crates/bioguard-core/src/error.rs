//! Error taxonomy shared by parsers, services, and stores.
//!
//! The original exception hierarchy collapses into a single flat enum:
//! every layer raises the most specific kind it can justify and the
//! controllers pattern-match on the variant to build the status-coded
//! response line. [`DomainError::CorruptedData`] and
//! [`DomainError::Persistence`] carry internal detail that is logged but
//! never written to the wire.

use thiserror::Error;

/// Errors raised across the BioGuard request pipeline.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DomainError {
    /// The body or content type does not follow a known FASTA dialect.
    #[error("{0}")]
    InvalidFormat(String),

    /// One or more fields violate the domain validation rules.
    #[error("{0}")]
    Validation(String),

    /// A referenced entity (patient, disease, or match) does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The operation collides with already-persisted state.
    #[error("{0}")]
    Conflict(String),

    /// Stored data failed integrity verification or could not be parsed.
    #[error("{0}")]
    CorruptedData(String),

    /// A filesystem operation failed.
    #[error("{context}: {source}")]
    Persistence {
        /// Description of the operation that failed.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// No controller is registered for the requested route.
    #[error("{0}")]
    RouteNotFound(String),

    /// The frame cannot be split into request-line, content-type, and body.
    #[error("{0}")]
    MalformedRequest(String),

    /// Catch-all for failures outside the taxonomy.
    #[error("{0}")]
    Unexpected(String),
}

impl DomainError {
    /// Convenience constructor for persistence failures with context.
    pub fn persistence(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Persistence {
            context: context.into(),
            source,
        }
    }
}
