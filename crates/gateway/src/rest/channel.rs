//! Channel REST endpoints: workspace channel administration and messages.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use huddle_database::{Channel, MessageType};

use crate::error::GatewayResult;
use crate::middleware::CallerIdentity;
use crate::rest::conversation::{CreateMessageRequest, DeletedResponse, MessageResponse};
use crate::state::GatewayState;

#[derive(Debug, Serialize, ToSchema)]
pub struct ChannelResponse {
    pub id: String,
    pub workspace_id: String,
    pub name: String,
    pub created_at: String,
}

impl From<Channel> for ChannelResponse {
    fn from(channel: Channel) -> Self {
        Self {
            id: channel.public_id,
            workspace_id: channel.workspace_id,
            name: channel.name,
            created_at: channel.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateChannelRequest {
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateChannelRequest {
    pub name: String,
}

/// Create channel routes
pub fn create_channel_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/api/workspaces/:workspace_id/channels", post(create_channel))
        .route(
            "/api/channels/:channel_id",
            put(update_channel).delete(delete_channel),
        )
        .route(
            "/api/channels/:channel_id/messages",
            get(list_messages).post(create_message),
        )
        .route(
            "/api/channels/:channel_id/messages/:message_id",
            axum::routing::delete(delete_message),
        )
}

#[utoipa::path(
    post,
    path = "/api/workspaces/{workspace_id}/channels",
    tag = "Channels",
    params(("workspace_id" = String, Path, description = "Workspace ID")),
    request_body = CreateChannelRequest,
    responses(
        (status = 201, description = "Channel created", body = ChannelResponse),
        (status = 400, description = "Invalid or duplicate name")
    )
)]
pub async fn create_channel(
    Path(workspace_id): Path<String>,
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<CallerIdentity>,
    Json(payload): Json<CreateChannelRequest>,
) -> GatewayResult<impl IntoResponse> {
    let channel = state
        .delivery
        .create_channel(&workspace_id, &payload.name, identity.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ChannelResponse::from(channel))))
}

#[utoipa::path(
    put,
    path = "/api/channels/{channel_id}",
    tag = "Channels",
    params(("channel_id" = String, Path, description = "Channel public ID")),
    request_body = UpdateChannelRequest,
    responses(
        (status = 200, description = "Channel renamed", body = ChannelResponse),
        (status = 403, description = "Protected channel or not a member"),
        (status = 404, description = "Channel not found")
    )
)]
pub async fn update_channel(
    Path(channel_id): Path<String>,
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<CallerIdentity>,
    Json(payload): Json<UpdateChannelRequest>,
) -> GatewayResult<Json<ChannelResponse>> {
    let channel = state
        .delivery
        .rename_channel(&channel_id, identity.user_id, &payload.name)
        .await?;
    Ok(Json(ChannelResponse::from(channel)))
}

#[utoipa::path(
    delete,
    path = "/api/channels/{channel_id}",
    tag = "Channels",
    params(("channel_id" = String, Path, description = "Channel public ID")),
    responses(
        (status = 200, description = "Channel and its messages removed", body = DeletedResponse),
        (status = 403, description = "Protected channel or not a member"),
        (status = 404, description = "Channel not found")
    )
)]
pub async fn delete_channel(
    Path(channel_id): Path<String>,
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<CallerIdentity>,
) -> GatewayResult<Json<DeletedResponse>> {
    let id = state
        .delivery
        .delete_channel(&channel_id, identity.user_id)
        .await?;
    Ok(Json(DeletedResponse { id }))
}

#[utoipa::path(
    get,
    path = "/api/channels/{channel_id}/messages",
    tag = "Channels",
    params(("channel_id" = String, Path, description = "Channel public ID")),
    responses(
        (status = 200, description = "Messages in ascending creation order", body = Vec<MessageResponse>),
        (status = 403, description = "Not a member"),
        (status = 404, description = "Channel not found")
    )
)]
pub async fn list_messages(
    Path(channel_id): Path<String>,
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<CallerIdentity>,
) -> GatewayResult<Json<Vec<MessageResponse>>> {
    let messages = state
        .delivery
        .list_channel_messages(&channel_id, identity.user_id)
        .await?;
    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/api/channels/{channel_id}/messages",
    tag = "Channels",
    params(("channel_id" = String, Path, description = "Channel public ID")),
    request_body = CreateMessageRequest,
    responses(
        (status = 201, description = "Message created and broadcast", body = MessageResponse),
        (status = 400, description = "Invalid content"),
        (status = 403, description = "Not a member"),
        (status = 404, description = "Channel not found")
    )
)]
pub async fn create_message(
    Path(channel_id): Path<String>,
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<CallerIdentity>,
    Json(payload): Json<CreateMessageRequest>,
) -> GatewayResult<impl IntoResponse> {
    let message_type = MessageType::from(payload.message_type.as_deref().unwrap_or("text"));

    let message = state
        .delivery
        .send_channel_message(
            &channel_id,
            identity.user_id,
            &payload.content,
            message_type,
            payload.file_name.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}

#[utoipa::path(
    delete,
    path = "/api/channels/{channel_id}/messages/{message_id}",
    tag = "Channels",
    params(
        ("channel_id" = String, Path, description = "Channel public ID"),
        ("message_id" = String, Path, description = "Message public ID")
    ),
    responses(
        (status = 200, description = "Message removed, tombstone broadcast", body = DeletedResponse),
        (status = 403, description = "Not the sender"),
        (status = 404, description = "Message not found")
    )
)]
pub async fn delete_message(
    Path((_channel_id, message_id)): Path<(String, String)>,
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<CallerIdentity>,
) -> GatewayResult<Json<DeletedResponse>> {
    let id = state
        .delivery
        .delete_message(&message_id, identity.user_id)
        .await?;
    Ok(Json(DeletedResponse { id }))
}
