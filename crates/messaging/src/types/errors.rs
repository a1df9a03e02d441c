//! Error taxonomy for the messaging core.
//!
//! Every failure before persistence leaves state unchanged and carries a
//! specific reason. Failures after a successful persist (broadcast to a
//! dead connection) are absorbed and never appear here.

use huddle_database::StoreError;
use thiserror::Error;

/// Result type alias for messaging operations
pub type MessagingResult<T> = Result<T, MessagingError>;

/// Main error type for the messaging core
#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("conversation not found: {id}")]
    ConversationNotFound { id: String },

    #[error("channel not found: {id}")]
    ChannelNotFound { id: String },

    #[error("message not found: {id}")]
    MessageNotFound { id: String },

    #[error("user not found: {id}")]
    UserNotFound { id: String },

    #[error("forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl MessagingError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not found error for conversations
    pub fn conversation_not_found(id: impl Into<String>) -> Self {
        Self::ConversationNotFound { id: id.into() }
    }

    /// Create a not found error for channels
    pub fn channel_not_found(id: impl Into<String>) -> Self {
        Self::ChannelNotFound { id: id.into() }
    }

    /// Create a not found error for messages
    pub fn message_not_found(id: impl Into<String>) -> Self {
        Self::MessageNotFound { id: id.into() }
    }

    /// Create a not found error for users
    pub fn user_not_found(id: impl Into<String>) -> Self {
        Self::UserNotFound { id: id.into() }
    }

    /// Create a forbidden error
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Wire-level error code, stable across message wording changes
    pub fn code(&self) -> &'static str {
        match self {
            MessagingError::Validation { .. } => "VALIDATION",
            MessagingError::ConversationNotFound { .. }
            | MessagingError::ChannelNotFound { .. }
            | MessagingError::MessageNotFound { .. }
            | MessagingError::UserNotFound { .. } => "NOT_FOUND",
            MessagingError::Forbidden { .. } => "FORBIDDEN",
            MessagingError::Store(_) | MessagingError::Internal { .. } => "INTERNAL",
        }
    }
}
