use axum::http::StatusCode;
use thiserror::Error;

use crate::common::response::ApiError;

pub type ClipResult<T> = Result<T, ClipError>;

/// Failure taxonomy shared by every pipeline operation.
#[derive(Debug, Error)]
pub enum ClipError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{tool} failed: {message}")]
    ToolFailure {
        tool: String,
        message: String,
        stderr: Option<String>,
    },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Stream resolution failed: {0}")]
    Resolution(String),

    #[error("Remote service error: {0}")]
    Remote(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClipError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn tool(tool: impl Into<String>, message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ToolFailure {
            tool: tool.into(),
            message: message.into(),
            stderr,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ClipError::Validation(_) => StatusCode::BAD_REQUEST,
            ClipError::Precondition(_) => StatusCode::CONFLICT,
            ClipError::NotFound(_) => StatusCode::NOT_FOUND,
            ClipError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ClipError::Resolution(_) | ClipError::Remote(_) => StatusCode::BAD_GATEWAY,
            ClipError::ToolFailure { .. } | ClipError::Persistence(_) | ClipError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ClipError> for ApiError {
    fn from(err: ClipError) -> Self {
        let status = err.status_code();
        let message = match &err {
            ClipError::ToolFailure {
                stderr: Some(stderr),
                ..
            } if !stderr.is_empty() => format!("{}\n{}", err, stderr),
            _ => err.to_string(),
        };
        ApiError(message, status)
    }
}

impl From<validator::ValidationErrors> for ClipError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ClipError::Validation(errors.to_string())
    }
}
