//! BioGuard diagnostics server library.
//!
//! The server accepts FASTA-framed requests over a TLS-wrapped TCP socket
//! and runs them through a synchronous pipeline: the transport reads one
//! frame, the router resolves a controller, the controller parses the body
//! and invokes a domain service, and the services persist through the
//! file-backed stores. Concurrency exists only across connections; within a
//! request everything runs to completion on one worker.
//!
//! # Modules
//!
//! - [`assembly`]: Dependency wiring from configuration to a ready router
//! - [`config`]: Properties-file configuration
//! - [`protocol`]: Frame codec, body parsers, router, and controllers
//! - [`service`]: Registration and diagnose business rules
//! - [`store`]: The five file-backed stores
//! - [`transport`]: TLS listener and per-connection lifecycle

pub mod assembly;
pub mod config;
pub mod protocol;
pub mod service;
pub mod store;
pub mod transport;
