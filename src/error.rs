//! Error types for the deployment list engine.
//!
//! No `anyhow` leakage. Explicit, typed errors. Store implementations map
//! their transport failures onto this taxonomy; the view derives every
//! user-facing message from [`MessageCategory`].

use crate::types::DeploymentId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server error: status={status}, message={message}")]
    Server { status: u16, message: String },

    #[error("validation failed: {}", .detail.as_deref().unwrap_or("no detail"))]
    Validation { detail: Option<String> },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("authentication required")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("unknown error: {0}")]
    Unknown(String),

    #[error("invalid view state: {0}")]
    InvalidState(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("status save already in flight for deployment {0}")]
    SaveInProgress(DeploymentId),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Category a failure falls into for user-facing messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageCategory {
    AuthRequired,
    Forbidden,
    AlreadyGone,
    DependencyConflict,
    ServerError,
    Validation,
    Network,
    Generic,
}

impl MessageCategory {
    /// Fixed text shown for this category.
    pub fn message(&self) -> &'static str {
        match self {
            MessageCategory::AuthRequired => "Your session has expired. Please sign in again.",
            MessageCategory::Forbidden => "You do not have permission to perform this action.",
            MessageCategory::AlreadyGone => "The deployment no longer exists.",
            MessageCategory::DependencyConflict => {
                "The deployment is referenced by other resources and cannot be changed."
            }
            MessageCategory::ServerError => "The server encountered an error. Try again later.",
            MessageCategory::Validation => "The request was rejected as invalid.",
            MessageCategory::Network => "Unable to reach the server. Check your connection.",
            MessageCategory::Generic => "Something went wrong. Please try again.",
        }
    }
}

impl SyncError {
    /// Classify an HTTP-like status code returned by a store.
    ///
    /// `detail` is the backend-provided message, if any. It is only kept
    /// verbatim for validation failures.
    pub fn from_status(status: u16, detail: Option<String>) -> Self {
        let text = detail.clone().unwrap_or_default();
        match status {
            400 | 422 => SyncError::Validation { detail },
            401 => SyncError::Unauthorized,
            403 => SyncError::Forbidden(text),
            404 => SyncError::NotFound(text),
            409 => SyncError::Conflict(text),
            500..=599 => SyncError::Server {
                status,
                message: text,
            },
            _ => SyncError::Unknown(format!("status {}: {}", status, text)),
        }
    }

    /// Which message category the UI should use for this error.
    pub fn category(&self) -> MessageCategory {
        match self {
            SyncError::Unauthorized => MessageCategory::AuthRequired,
            SyncError::Forbidden(_) => MessageCategory::Forbidden,
            SyncError::NotFound(_) => MessageCategory::AlreadyGone,
            SyncError::Conflict(_) => MessageCategory::DependencyConflict,
            SyncError::Server { .. } => MessageCategory::ServerError,
            SyncError::Validation { .. } => MessageCategory::Validation,
            SyncError::Network(_) => MessageCategory::Network,
            _ => MessageCategory::Generic,
        }
    }

    /// User-facing message. Raw transport text never leaks, except the
    /// backend detail of a validation failure.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::Validation {
                detail: Some(detail),
            } if !detail.trim().is_empty() => detail.clone(),
            other => other.category().message().to_string(),
        }
    }

    /// Whether this error might go away if the user tries again.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SyncError::Network(_) | SyncError::Server { .. } | SyncError::SaveInProgress(_)
        )
    }
}
