//! Error types for the interaction core.

use thiserror::Error;

/// Local, recoverable error raised before any network call is made.
///
/// Rendered inline next to the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ValidationError {
    /// The draft has no `to` recipient.
    #[error("Please enter at least one recipient")]
    MissingRecipient,
    /// The draft subject is empty after trimming.
    #[error("Please enter a subject")]
    EmptySubject,
    /// A recipient address without an `@`.
    #[error("Invalid email address: {0}")]
    InvalidEmail(String),
}

impl ValidationError {
    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::MissingRecipient | Self::InvalidEmail(_) => "to",
            Self::EmptySubject => "subject",
        }
    }
}

/// Error reported by a remote collaborator (mutation gateway or AI service).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The backend rejected the request with a user-displayable message.
    #[error("{0}")]
    Rejected(String),

    /// The bounded wait for the request elapsed.
    #[error("Request timed out")]
    TimedOut,

    /// The task running the request panicked or was cancelled.
    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl ServiceError {
    /// Creates a rejection carrying the backend's message.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    /// Message suitable for showing to the user.
    ///
    /// Unexpected failures never leak their internals.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected(message) => message.clone(),
            Self::TimedOut => "The request took too long. Please try again.".to_string(),
            Self::Unexpected(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Draft failed local validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Remote operation failed.
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_fields() {
        assert_eq!(ValidationError::MissingRecipient.field(), "to");
        assert_eq!(ValidationError::InvalidEmail("bob".into()).field(), "to");
        assert_eq!(ValidationError::EmptySubject.field(), "subject");
    }

    #[test]
    fn test_user_message_hides_unexpected_details() {
        let err = ServiceError::Unexpected("task 12 panicked at gateway.rs:40".into());
        assert!(!err.user_message().contains("panicked"));

        let err = ServiceError::rejected("Mailbox is full");
        assert_eq!(err.user_message(), "Mailbox is full");
    }
}
