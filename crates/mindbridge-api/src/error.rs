use reqwest::StatusCode;
use thiserror::Error;

use mindbridge_core::models::user::Role;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {detail}")]
    Status { status: StatusCode, detail: String },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("not signed in")]
    Unauthenticated,

    #[error("{0} accounts do not manage children")]
    NotGuardian(Role),

    #[error("invalid base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// The server's own explanation when it gave one, otherwise the error
    /// text. This is what gets shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}
