//! Error taxonomy for calls against the Task Backend API.

use thiserror::Error;

/// Broad class of an HTTP failure status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    /// The backend rejected the payload (400, 422).
    Validation,
    /// The addressed task does not exist (404).
    NotFound,
    /// Network failure, timeout, undecodable body or any other non-2xx status.
    Transport,
}

impl std::fmt::Display for ClientErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::NotFound => write!(f, "not found"),
            Self::Transport => write!(f, "transport"),
        }
    }
}

/// Classify an HTTP status code into an error kind.
pub fn classify_http_status(status: u16) -> ClientErrorKind {
    match status {
        404 => ClientErrorKind::NotFound,
        400 | 422 => ClientErrorKind::Validation,
        _ => ClientErrorKind::Transport,
    }
}

/// Exactly one of these is surfaced per failed gateway call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("Backend rejected the request: {0}")]
    Validation(String),

    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl ClientError {
    /// Build an error from a non-2xx status and the response body.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = if body.is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {}: {}", status, body)
        };
        match classify_http_status(status) {
            ClientErrorKind::Validation => Self::Validation(message),
            ClientErrorKind::NotFound => Self::NotFound(message),
            ClientErrorKind::Transport => Self::Transport(message),
        }
    }

    pub fn kind(&self) -> ClientErrorKind {
        match self {
            Self::Validation(_) => ClientErrorKind::Validation,
            Self::NotFound(_) => ClientErrorKind::NotFound,
            Self::Transport(_) => ClientErrorKind::Transport,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ClientErrorKind::NotFound
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Transport(format!("Request timeout: {}", e))
        } else if e.is_connect() {
            Self::Transport(format!("Connection failed: {}", e))
        } else if e.is_decode() {
            Self::Transport(format!("Failed to decode response: {}", e))
        } else {
            Self::Transport(format!("Request failed: {}", e))
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
