//! # Huddle Gateway Crate
//!
//! The transport layer for the Huddle messaging core: HTTP REST and
//! WebSocket endpoints routed into the shared delivery service.
//!
//! ## Architecture
//!
//! - **REST**: conversation, channel, and read-tracking endpoints with
//!   OpenAPI documentation
//! - **WebSocket**: the live event stream, one recv/send task pair per
//!   connection
//! - **State**: the shared delivery core and room registry
//! - **Middleware**: forwarded-identity resolution, CORS, logging
//!
//! Both transports call the same delivery entry points, so a mutation is
//! validated, persisted, and broadcast identically no matter where it
//! entered.

pub mod error;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod websocket;

pub use error::{GatewayError, GatewayResult};
pub use state::GatewayState;

use axum::{http::Method, middleware as axum_middleware, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create the main application router with all routes
pub fn create_router(state: GatewayState) -> Router {
    let arc_state = Arc::new(state);

    // Identity applies to the API and socket surfaces, not to health.
    let guarded = rest::create_rest_routes()
        .merge(websocket::create_websocket_routes())
        .layer(axum_middleware::from_fn_with_state(
            arc_state.clone(),
            middleware::identity_middleware,
        ));

    let mut router = Router::new()
        .merge(guarded.with_state(arc_state.clone()))
        .merge(rest::create_health_routes().with_state(arc_state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers(Any),
        )
        .layer(axum_middleware::from_fn(middleware::logging_middleware));

    // Add Swagger UI if in debug mode
    #[cfg(debug_assertions)]
    {
        #[derive(OpenApi)]
        #[openapi(
            paths(
                rest::health::health_check,
                rest::conversation::start_conversation,
                rest::conversation::list_conversations,
                rest::conversation::list_messages,
                rest::conversation::create_message,
                rest::conversation::update_message,
                rest::conversation::delete_message,
                rest::conversation::mark_read,
                rest::channel::create_channel,
                rest::channel::update_channel,
                rest::channel::delete_channel,
                rest::channel::list_messages,
                rest::channel::create_message,
                rest::channel::delete_message,
            ),
            components(
                schemas(
                    rest::health::HealthResponse,
                    rest::conversation::ConversationResponse,
                    rest::conversation::InboxEntryResponse,
                    rest::conversation::MessageResponse,
                    rest::conversation::StartConversationRequest,
                    rest::conversation::CreateMessageRequest,
                    rest::conversation::UpdateMessageRequest,
                    rest::conversation::ReadResponse,
                    rest::conversation::DeletedResponse,
                    rest::channel::ChannelResponse,
                    rest::channel::CreateChannelRequest,
                    rest::channel::UpdateChannelRequest,
                )
            ),
            tags(
                (name = "Health", description = "Service health"),
                (name = "Conversations", description = "Direct conversations and read tracking"),
                (name = "Channels", description = "Workspace channels"),
            )
        )]
        struct ApiDoc;

        router = router
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    router
}
