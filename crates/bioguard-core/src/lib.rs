//! # bioguard-core
//!
//! Core library for BioGuard - a TLS-secured TCP service for bioinformatic
//! diagnostics.
//!
//! This crate holds everything the server shares across its layers and that
//! does not depend on the runtime: the domain model, the FASTA text
//! utilities, the SHA-256 content-integrity verifier, the mutation
//! change-segment algorithm, and the error taxonomy.
//!
//! ## Modules
//!
//! - [`error`]: The flat [`DomainError`] taxonomy surfaced through the
//!   request pipeline
//! - [`fasta`]: Line splitting, header parsing, and sequence extraction for
//!   FASTA-framed messages
//! - [`integrity`]: Content hashing and filename-bound file verification
//! - [`model`]: Patients, diseases, diagnostics, and their enumerations
//! - [`mutation`]: Change segments between a sample and its prior samples

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod fasta;
pub mod integrity;
pub mod model;
pub mod mutation;

pub use error::DomainError;
pub use model::{
    DiagnoseOutcome, DiagnoseRequest, Diagnostic, Disease, Gender, InfectiousnessLevel, Patient,
};
pub use mutation::{ChangeKind, ChangeSegment};
