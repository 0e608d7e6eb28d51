//! Controllers: parse the body, invoke the service, map errors to
//! status-coded responses.
//!
//! All three controllers share the uniform response shape
//! `[TCP][<code>][<category>] <message>`. The mapping preserves one quirk
//! of the external contract: a duplicate registration (patient or disease)
//! surfaces as `400 ValidationError`, while a duplicate diagnose sample
//! surfaces as `409 Conflict`. `CorruptedData` and `Persistence` always
//! collapse into the generic internal-error line.

use std::sync::Arc;

use bioguard_core::error::DomainError;
use bioguard_core::model::{DiagnoseRequest, Disease, Patient};
use tracing::{info, warn};

use super::message::{status_line, Request, Response, INTERNAL_ERROR_LINE};
use super::parse::ParserRegistry;
use super::router::MessageHandler;
use crate::service::{DiagnoseService, DiseaseService, PatientService};

const MESSAGE_SEPARATOR: &str = " | ";

/// Maps an error to a response for the registration controllers, where a
/// store conflict belongs to the validation category.
fn registration_error_response(error: &DomainError) -> Response {
    match error {
        DomainError::InvalidFormat(message) => {
            let line = status_line(400, "InvalidFormat", message);
            info!("{line}");
            Response::new(400, line)
        }
        DomainError::Validation(message) | DomainError::Conflict(message) => {
            let line = status_line(400, "ValidationError", message);
            info!("{line}");
            Response::new(400, line)
        }
        DomainError::NotFound(message) => {
            let line = status_line(404, "NotFound", message);
            info!("{line}");
            Response::new(404, line)
        }
        other => {
            warn!(error = %other, "internal error");
            Response::new(500, INTERNAL_ERROR_LINE.to_owned())
        }
    }
}

/// Maps an error to a response for the diagnose controller, where a
/// duplicate sample keeps its conflict status.
fn diagnose_error_response(error: &DomainError) -> Response {
    match error {
        DomainError::InvalidFormat(message) => {
            let line = status_line(400, "InvalidFormat", message);
            info!("{line}");
            Response::new(400, line)
        }
        DomainError::Validation(message) => {
            let line = status_line(400, "ValidationError", message);
            info!("{line}");
            Response::new(400, line)
        }
        DomainError::NotFound(message) => {
            let line = status_line(404, "NotFound", message);
            info!("{line}");
            Response::new(404, line)
        }
        DomainError::Conflict(message) => {
            let line = status_line(409, "Conflict", message);
            info!("{line}");
            Response::new(409, line)
        }
        other => {
            warn!(error = %other, "internal error");
            Response::new(500, INTERNAL_ERROR_LINE.to_owned())
        }
    }
}

/// Controller for `POST:patient`.
pub struct PatientRegisterController {
    service: Arc<PatientService>,
    parsers: ParserRegistry<Patient>,
}

impl PatientRegisterController {
    /// Builds the controller over its service and parser registry.
    pub fn new(service: Arc<PatientService>, parsers: ParserRegistry<Patient>) -> Self {
        Self { service, parsers }
    }
}

impl MessageHandler for PatientRegisterController {
    fn process(&self, request: &Request) -> Response {
        let result = self
            .parsers
            .parse(&request.content_type, &request.body)
            .and_then(|patient| self.service.register(patient));
        match result {
            Ok(saved) => {
                let uuid = saved.uuid.map(|u| u.to_string()).unwrap_or_default();
                let line = status_line(
                    201,
                    "Created",
                    &format!("paciente registrado exitosamente con uuid: {uuid}"),
                );
                info!("{line}");
                Response::new(201, line)
            }
            Err(error) => registration_error_response(&error),
        }
    }
}

/// Controller for `POST:disease`.
pub struct DiseaseRegisterController {
    service: Arc<DiseaseService>,
    parsers: ParserRegistry<Disease>,
}

impl DiseaseRegisterController {
    /// Builds the controller over its service and parser registry.
    pub fn new(service: Arc<DiseaseService>, parsers: ParserRegistry<Disease>) -> Self {
        Self { service, parsers }
    }
}

impl MessageHandler for DiseaseRegisterController {
    fn process(&self, request: &Request) -> Response {
        let result = self
            .parsers
            .parse(&request.content_type, &request.body)
            .and_then(|disease| self.service.register(disease));
        match result {
            Ok(saved) => {
                let line = status_line(
                    201,
                    "Created",
                    &format!("virus {} registrado exitosamente", saved.name),
                );
                info!("{line}");
                Response::new(201, line)
            }
            Err(error) => registration_error_response(&error),
        }
    }
}

/// Controller for `POST:diagnose`.
pub struct DiagnoseController {
    service: Arc<DiagnoseService>,
    parsers: ParserRegistry<DiagnoseRequest>,
}

impl DiagnoseController {
    /// Builds the controller over its service and parser registry.
    pub fn new(service: Arc<DiagnoseService>, parsers: ParserRegistry<DiagnoseRequest>) -> Self {
        Self { service, parsers }
    }
}

impl MessageHandler for DiagnoseController {
    fn process(&self, request: &Request) -> Response {
        let result = self
            .parsers
            .parse(&request.content_type, &request.body)
            .and_then(|message| self.service.diagnose(&message));
        match result {
            Ok(outcome) => {
                let mut message = status_line(200, "Success", "diagnostico generado exitosamente");
                if !outcome.operation_messages.is_empty() {
                    message.push_str(MESSAGE_SEPARATOR);
                    message.push_str(&outcome.operation_messages.join(MESSAGE_SEPARATOR));
                }
                info!("{message}");
                Response::new(200, message)
            }
            Err(error) => diagnose_error_response(&error),
        }
    }
}
