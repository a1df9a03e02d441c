//! Error types for the gateway layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use huddle_messaging::MessagingError;

/// Gateway error types
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            GatewayError::AuthorizationFailed(_) => StatusCode::FORBIDDEN,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::InternalError(_) | GatewayError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = json!({
            "error": status.as_str(),
            "message": self.to_string(),
        });

        (status, Json(error_response)).into_response()
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<MessagingError> for GatewayError {
    fn from(error: MessagingError) -> Self {
        match error {
            MessagingError::Validation { message } => GatewayError::InvalidRequest(message),
            MessagingError::Forbidden { reason } => GatewayError::AuthorizationFailed(reason),
            MessagingError::ConversationNotFound { id } => {
                GatewayError::NotFound(format!("Conversation not found: {id}"))
            }
            MessagingError::ChannelNotFound { id } => {
                GatewayError::NotFound(format!("Channel not found: {id}"))
            }
            MessagingError::MessageNotFound { id } => {
                GatewayError::NotFound(format!("Message not found: {id}"))
            }
            MessagingError::UserNotFound { id } => {
                GatewayError::NotFound(format!("User not found: {id}"))
            }
            MessagingError::Store(error) => GatewayError::DatabaseError(error.to_string()),
            MessagingError::Internal { message } => GatewayError::InternalError(message),
        }
    }
}

impl From<huddle_database::StoreError> for GatewayError {
    fn from(error: huddle_database::StoreError) -> Self {
        GatewayError::DatabaseError(error.to_string())
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(error: sqlx::Error) -> Self {
        GatewayError::DatabaseError(error.to_string())
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(error: serde_json::Error) -> Self {
        GatewayError::InvalidRequest(format!("JSON serialization error: {}", error))
    }
}
