use reqwest::StatusCode;
use thiserror::Error;

/// Failures raised by the HTTP transport before a protocol payload is available.
///
/// A Yggdrasil server reports rejections as JSON error payloads; those reach
/// the session layer as bodies. Only answers that carry no such payload end
/// up here.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Auth server answered {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl TransportError {
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        TransportError::Status {
            status,
            body: Self::truncate_body(body.trim()),
        }
    }

    /// The status code, when the server answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Network(e) => e.status(),
            TransportError::InvalidResponse(_) => None,
        }
    }

    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... ({} bytes)", &body[..end], body.len())
    }
}
