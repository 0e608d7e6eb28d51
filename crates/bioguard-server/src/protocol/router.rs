//! Routing table for `METHOD:action` dispatch.
//!
//! The router splits one frame into its three parts (request line, content
//! type, body), resolves the controller from the routing table, and maps
//! the framing failures itself: a blank or short frame is a malformed
//! request (400), an unknown route is 404, and anything unexpected
//! collapses into the generic internal-error line.

use std::collections::HashMap;
use std::sync::Arc;

use bioguard_core::error::DomainError;
use tracing::{info, warn};

use super::message::{status_line, Request, Response, INTERNAL_ERROR_LINE};

/// Number of parts a frame splits into.
const EXPECTED_PARTS: usize = 3;
/// Number of tokens on the request line.
const EXPECTED_REQUEST_LINE_PARTS: usize = 2;

/// A controller reachable from the routing table.
pub trait MessageHandler: Send + Sync {
    /// Processes one request into one response; never fails, the
    /// controller maps its errors into status-coded responses itself.
    fn process(&self, request: &Request) -> Response;
}

/// `METHOD:action` routing table.
#[derive(Default)]
pub struct Router {
    routes: HashMap<String, Arc<dyn MessageHandler>>,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` under `METHOD:action` (case-sensitive).
    pub fn register(&mut self, method: &str, action: &str, handler: Arc<dyn MessageHandler>) {
        self.routes.insert(format!("{method}:{action}"), handler);
    }

    /// Dispatches one raw frame and always produces a response.
    pub fn dispatch(&self, message: &str) -> Response {
        match self.try_dispatch(message) {
            Ok(response) => response,
            Err(DomainError::MalformedRequest(reason)) => {
                let line = status_line(400, "MalformedRequest", &reason);
                warn!("{line}");
                Response::new(400, line)
            }
            Err(DomainError::RouteNotFound(reason)) => {
                let line = status_line(404, "RouteNotFound", &reason);
                warn!("{line}");
                Response::new(404, line)
            }
            Err(error) => {
                warn!(%error, "router error");
                Response::new(500, INTERNAL_ERROR_LINE.to_owned())
            }
        }
    }

    /// Parses the frame and routes it to its controller.
    fn try_dispatch(&self, message: &str) -> Result<Response, DomainError> {
        if message.trim().is_empty() {
            return Err(DomainError::MalformedRequest(
                "El mensaje recibido esta vacio o es nulo".to_owned(),
            ));
        }

        let parts: Vec<&str> = message.splitn(EXPECTED_PARTS, '\n').collect();
        if parts.len() < EXPECTED_PARTS {
            return Err(DomainError::MalformedRequest(format!(
                "El mensaje debe contener al menos {EXPECTED_PARTS} partes: request-line, \
                 content-type y body. Se recibieron {} parte(s)",
                parts.len()
            )));
        }

        let request_line = parts[0].trim();
        let tokens: Vec<&str> = request_line.split(' ').collect();
        if tokens.len() < EXPECTED_REQUEST_LINE_PARTS {
            return Err(DomainError::MalformedRequest(format!(
                "La linea de solicitud debe contener metodo y accion separados por espacio. \
                 Se recibio: '{request_line}'"
            )));
        }

        let method = tokens[0].trim();
        let action = tokens[1].trim();
        let route_key = format!("{method}:{action}");
        let Some(handler) = self.routes.get(&route_key) else {
            return Err(DomainError::RouteNotFound(format!(
                "No se encontro un procesador para la ruta: {route_key}"
            )));
        };

        let request = Request {
            method: method.to_owned(),
            action: action.to_owned(),
            content_type: parts[1].trim().to_owned(),
            body: parts[2].trim().to_owned(),
        };
        info!(method, action, "request routed");
        Ok(handler.process(&request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Echo handler capturing what the router hands over.
    struct Echo;

    impl MessageHandler for Echo {
        fn process(&self, request: &Request) -> Response {
            Response::new(
                200,
                format!(
                    "{}|{}|{}|{}",
                    request.method, request.action, request.content_type, request.body
                ),
            )
        }
    }

    fn router() -> Router {
        let mut router = Router::new();
        router.register("POST", "diagnose", Arc::new(Echo));
        router
    }

    #[test]
    fn blank_frame_is_malformed() {
        let response = router().dispatch("  \n ");
        assert_eq!(response.status, 400);
        assert!(response.message.starts_with("[TCP][400][MalformedRequest]"));
    }

    #[test]
    fn short_frame_is_malformed() {
        let response = router().dispatch("POST diagnose\napplication/fasta");
        assert_eq!(response.status, 400);
        assert!(response.message.contains("2 parte(s)"));
    }

    #[test]
    fn request_line_needs_method_and_action() {
        let response = router().dispatch("POST\napplication/fasta\nbody");
        assert_eq!(response.status, 400);
        assert!(response.message.contains("metodo y accion"));
    }

    #[test]
    fn unknown_route_is_404() {
        let response = router().dispatch("GET diagnose\napplication/fasta\nbody");
        assert_eq!(response.status, 404);
        assert!(response
            .message
            .starts_with("[TCP][404][RouteNotFound]"));
        assert!(response.message.contains("GET:diagnose"));
    }

    #[test]
    fn route_key_is_case_sensitive() {
        let response = router().dispatch("post diagnose\napplication/fasta\nbody");
        assert_eq!(response.status, 404);
    }

    #[test]
    fn body_keeps_its_interior_newlines() {
        let response = router().dispatch("POST diagnose\napplication/fasta\n>1|2\nACGT");
        assert_eq!(response.status, 200);
        assert_eq!(
            response.message,
            "POST|diagnose|application/fasta|>1|2\nACGT"
        );
    }

    #[test]
    fn parts_are_trimmed_before_dispatch() {
        let response = router().dispatch(" POST diagnose \n application/fasta \n body ");
        assert_eq!(response.message, "POST|diagnose|application/fasta|body");
    }
}
