//! Client error types.

use std::fmt;

use thiserror::Error;

use crate::content::ContentFamily;

/// Boxed error type used for causes coming out of an HTTP backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration. Raised at construction, never at request time.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The requested query is structurally invalid for the target resource.
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    /// The request was issued and failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body did not match the expected content shape.
    #[error("Unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),

    /// A textual content path could not be parsed.
    #[error("Invalid content path: {0}")]
    InvalidPath(String),
}

impl Error {
    /// Check if this is a request validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Check if this is a transport failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Machine-readable transport code, if this is a transport failure.
    pub fn transport_code(&self) -> Option<ErrorCode> {
        match self {
            Error::Transport(err) => Some(err.code()),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

// ─────────────────────────────────────────────────────────────────────────────
// Validation
// ─────────────────────────────────────────────────────────────────────────────

/// A caller-supplied query combination the API cannot serve.
///
/// Always raised before any request is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Both `order` and `offset` were supplied.
    #[error("random ordering with offset is not supported")]
    OrderWithOffset,

    /// A tree-relation filter was supplied for a non-page family.
    #[error("tree-position filtering is supported only for pages")]
    TreeFilterOnNonPage {
        /// The family the filter was sent to.
        family: ContentFamily,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Transport
// ─────────────────────────────────────────────────────────────────────────────

/// Machine-readable transport failure code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The server answered with a non-success status.
    RequestFailed,
    /// Anything else: network failure, unreadable body, invalid JSON.
    UnexpectedError,
}

impl ErrorCode {
    /// The wire form of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::RequestFailed => "REQUEST_FAILED",
            ErrorCode::UnexpectedError => "UNEXPECTED_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single outbound request.
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct TransportError {
    code: ErrorCode,
    message: String,
    status: Option<u16>,
    #[source]
    source: Option<BoxError>,
}

impl TransportError {
    /// The server answered with a non-success status.
    pub fn request_failed(status: u16) -> Self {
        Self {
            code: ErrorCode::RequestFailed,
            message: format!("Request failed with status {}", status),
            status: Some(status),
            source: None,
        }
    }

    /// The call failed for any other reason.
    pub fn unexpected(source: impl Into<BoxError>) -> Self {
        let source = source.into();
        Self {
            code: ErrorCode::UnexpectedError,
            message: format!("Unexpected error: {}", source),
            status: None,
            source: Some(source),
        }
    }

    /// Machine-readable failure code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        self.status
    }
}
