//! REST API endpoints for the gateway

pub mod channel;
pub mod conversation;
pub mod health;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::state::GatewayState;

/// Create all REST API routes
pub fn create_rest_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .merge(conversation::create_conversation_routes())
        .merge(channel::create_channel_routes())
}

/// Health lives outside the identity middleware: probes carry no caller.
pub fn create_health_routes() -> Router<Arc<GatewayState>> {
    Router::new().route("/health", get(health::health_check))
}
