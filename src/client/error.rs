use crate::domain::{ApiStatus, Diagnostic, SchemaError, ValidationError};
use crate::marshalling::MarshallError;
use crate::transport::TransportError;

#[derive(Debug, thiserror::Error)]
/// Errors returned by [`SklikClient`](crate::SklikClient).
pub enum SklikError {
    /// The server speaks another protocol generation.
    #[error("incompatible API version {found:?}, only \"{expected}\" is supported")]
    IncompatibleApiVersion {
        expected: &'static str,
        found: String,
    },

    /// Bad credentials, or a session rejected at login/logout.
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    /// Session invalid mid-call (301 / 401); retried with a fresh login.
    #[error("session error: {message}")]
    Session { message: String },

    /// Malformed request (400).
    #[error("argument error: {message}")]
    Argument {
        message: String,
        problems: Vec<Diagnostic>,
    },

    /// Server-side validation failed (206 / 406).
    #[error("invalid data ({}): {message}{}", .status.as_i32(), diagnostic_ids(.diagnostics))]
    InvalidData {
        status: ApiStatus,
        message: String,
        diagnostics: Vec<Diagnostic>,
    },

    #[error("access denied: {message}")]
    Access { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    /// Any other non-success status, or a call without a session.
    #[error("Sklik API error{}: {message}", .status.map(|s| format!(" {}", s.as_i32())).unwrap_or_default())]
    Api {
        status: Option<ApiStatus>,
        message: String,
    },

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("unexpected response shape: {0}")]
    Marshall(#[from] MarshallError),

    #[error("entity error: {0}")]
    Schema(#[from] SchemaError),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl SklikError {
    pub(crate) fn no_session() -> Self {
        Self::Api {
            status: None,
            message: "no session".to_owned(),
        }
    }

    /// The API status code behind this error, when there is one.
    pub fn status(&self) -> Option<ApiStatus> {
        match self {
            Self::InvalidData { status, .. } => Some(*status),
            Self::Api { status, .. } => *status,
            _ => None,
        }
    }
}

fn diagnostic_ids(diagnostics: &[Diagnostic]) -> String {
    if diagnostics.is_empty() {
        return String::new();
    }
    let ids = diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!(" [{ids}]")
}
