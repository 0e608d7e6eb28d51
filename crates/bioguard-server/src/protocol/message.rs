//! Request and response records for the framed protocol.
//!
//! The builder patterns of compatible implementations collapse into plain
//! records: a request needs four fields on the way in, a response two on
//! the way out.

/// One parsed request frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Request method (e.g. `POST`).
    pub method: String,
    /// Requested action (e.g. `diagnose`).
    pub action: String,
    /// Declared content type (e.g. `application/fasta`).
    pub content_type: String,
    /// Raw body; may itself contain newlines.
    pub body: String,
}

/// One response frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code mirrored in the message prefix.
    pub status: u16,
    /// Full status line, `[TCP][<code>][<category>] <message>`.
    pub message: String,
}

impl Response {
    /// Builds a response from its code and pre-formatted status line.
    #[must_use]
    pub fn new(status: u16, message: String) -> Self {
        Self { status, message }
    }

    /// The wire payload of this response.
    #[must_use]
    pub fn render(&self) -> &str {
        &self.message
    }
}

/// Formats the uniform status line.
#[must_use]
pub fn status_line(code: u16, category: &str, message: &str) -> String {
    format!("[TCP][{code}][{category}] {message}")
}

/// Generic internal-error line; never carries internal detail.
pub const INTERNAL_ERROR_LINE: &str = "[TCP][500][InternalError] Error interno del servidor";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_has_the_uniform_shape() {
        assert_eq!(
            status_line(201, "Created", "paciente registrado exitosamente"),
            "[TCP][201][Created] paciente registrado exitosamente"
        );
    }

    #[test]
    fn render_returns_the_full_line() {
        let response = Response::new(200, status_line(200, "Success", "ok"));
        assert_eq!(response.render(), "[TCP][200][Success] ok");
    }
}
