use tracing::{error, warn};

use crate::models::QuizId;

/// Error shape surfaced to the presentation layer by every client operation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuizError {
    /// Local validation failure; never reaches the network
    #[error("{0}")]
    InvalidInput(String),

    /// Any non-success HTTP outcome or transport failure
    #[error("{0}")]
    Service(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Service,
}

impl QuizError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        QuizError::InvalidInput(message.into())
    }

    pub fn service(message: impl Into<String>) -> Self {
        QuizError::Service(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            QuizError::InvalidInput(_) => ErrorKind::InvalidInput,
            QuizError::Service(_) => ErrorKind::Service,
        }
    }

    /// Display message shown to the user
    pub fn message(&self) -> &str {
        match self {
            QuizError::InvalidInput(message) | QuizError::Service(message) => message,
        }
    }
}

/// Error context for structured logging at the point a service failure is created
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub operation: String,
    pub quiz_id: Option<QuizId>,
    pub fallback_message: String,
}

impl ErrorContext {
    pub fn new(operation: &str, fallback_message: &str) -> Self {
        Self {
            operation: operation.to_string(),
            quiz_id: None,
            fallback_message: fallback_message.to_string(),
        }
    }

    pub fn with_id(mut self, id: QuizId) -> Self {
        self.quiz_id = Some(id);
        self
    }

    /// Failure reported by the service itself. `detail` replaces the fallback message when present.
    pub fn rejected(&self, status: u16, detail: Option<&str>) -> QuizError {
        let message = detail.unwrap_or(&self.fallback_message).to_string();
        warn!(
            operation = %self.operation,
            quiz_id = ?self.quiz_id,
            status = status,
            error = %message,
            "Service rejected request"
        );
        QuizError::Service(message)
    }

    /// Failure below HTTP (connection refused, reset, undecodable body); surfaced verbatim
    pub fn transport(&self, err: impl std::fmt::Display) -> QuizError {
        let message = err.to_string();
        error!(
            operation = %self.operation,
            quiz_id = ?self.quiz_id,
            error = %message,
            "Service request failed"
        );
        QuizError::Service(message)
    }
}
