//! Middleware for caller identity and request logging.
//!
//! Identity issuance is out of scope here: the upstream auth layer
//! terminates sessions and forwards the caller's public user ID in the
//! `x-user-id` header (or the `user_id` query parameter for WebSocket
//! upgrades, where custom headers are unavailable to browsers). This
//! middleware resolves that ID against the user table and stashes the
//! internal identity in request extensions.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::GatewayError;
use crate::state::GatewayState;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Resolved caller identity carried in request extensions
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub user_id: i64,
    pub public_id: String,
    pub display_name: String,
}

/// Identity middleware: resolves the forwarded user ID and rejects
/// requests that carry none or an unknown one.
pub async fn identity_middleware(
    State(state): State<Arc<GatewayState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let header_id = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let query_id = request.uri().query().and_then(|query| {
        query.split('&').find_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            match (parts.next(), parts.next()) {
                (Some("user_id"), Some(value)) => Some(value.to_string()),
                _ => None,
            }
        })
    });

    let public_id = header_id.or(query_id).ok_or_else(|| {
        GatewayError::AuthenticationFailed("Missing forwarded user identity".to_string())
    })?;

    let user = state
        .users
        .find_by_public_id(&public_id)
        .await?
        .ok_or_else(|| {
            GatewayError::AuthenticationFailed(format!("Unknown user: {public_id}"))
        })?;

    request.extensions_mut().insert(CallerIdentity {
        user_id: user.id,
        public_id: user.public_id,
        display_name: user.display_name,
    });

    Ok(next.run(request).await)
}

/// Logging middleware for request/response logging
pub async fn logging_middleware(
    request: Request,
    next: Next,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let start = std::time::Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %response.status(),
        duration_ms = duration.as_millis(),
        "Request completed"
    );

    Ok(response)
}
