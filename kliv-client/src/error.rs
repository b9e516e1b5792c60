//! Error types for the resource clients.

use serde_json::Value;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur when talking to the backend.
///
/// Server-originated variants display exactly the message the server sent,
/// so callers can surface it verbatim.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A local precondition failed. Raised before any request is made.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// Non-success response from the database or content service.
    #[error("{message}")]
    Request { status: u16, message: String },

    /// Non-success response from the auth service.
    #[error("{message}")]
    Auth { status: u16, message: String },

    /// File upload failed or was cancelled.
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Non-success response from a remote function.
    #[error("{message}")]
    Function {
        status: u16,
        message: String,
        details: Value,
    },

    /// Transport failure (DNS, connection reset, TLS, timeout).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A success body could not be parsed, or input could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading a local file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The client configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Returns the HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Request { status, .. }
            | ClientError::Auth { status, .. }
            | ClientError::Function { status, .. } => Some(*status),
            ClientError::Upload(UploadError::Status { status, .. }) => Some(*status),
            ClientError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true if this is an upload that was cancelled by the caller.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Upload(UploadError::Cancelled))
    }
}

/// Upload-specific failures.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Upload cancelled")]
    Cancelled,

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Invalid JSON response")]
    InvalidResponse,
}

/// Picks the first non-empty string among `keys` in an error body.
pub(crate) fn first_message<'a>(body: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| body.get(*k).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

/// Decodes an error body: `message`, then `error`, then `fallback`.
pub fn error_message(body: &Value, fallback: &str) -> String {
    first_message(body, &["message", "error"])
        .unwrap_or(fallback)
        .to_string()
}
