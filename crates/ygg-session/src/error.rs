use thiserror::Error;

use crate::api::protocol::ErrorPayload;
use crate::api::TransportError;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The server answered with an error payload, no payload at all, or a
    /// payload that does not belong to this session.
    #[error("{}", format_protocol(.error, .message.as_deref(), .cause.as_deref()))]
    Protocol {
        error: String,
        message: Option<String>,
        cause: Option<String>,
    },

    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

fn format_protocol(error: &str, message: Option<&str>, cause: Option<&str>) -> String {
    match (message, cause) {
        (None, None) => error.to_string(),
        (message, cause) => format!(
            "{}: {} ({})",
            error,
            message.unwrap_or("null"),
            cause.unwrap_or("null")
        ),
    }
}

impl SessionError {
    /// Protocol failure detected on the client side, with no server details
    pub fn protocol(error: impl Into<String>) -> Self {
        SessionError::Protocol {
            error: error.into(),
            message: None,
            cause: None,
        }
    }

    /// Convert a server error payload, if it actually carries an error
    pub(crate) fn from_payload(payload: ErrorPayload) -> Option<Self> {
        if !payload.is_error() {
            return None;
        }
        Some(SessionError::Protocol {
            error: payload.error.unwrap_or_default(),
            message: payload.error_message,
            cause: payload.cause,
        })
    }
}
