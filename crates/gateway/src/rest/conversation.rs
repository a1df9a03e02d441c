//! Conversation REST endpoints: the DM surface.
//!
//! Every mutation funnels into the delivery service, so a message created
//! here is broadcast to live socket connections exactly like one created
//! over the socket.

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

use huddle_database::{MessageRecord, MessageType};
use huddle_messaging::InboxEntry;

use crate::error::{GatewayError, GatewayResult};
use crate::middleware::CallerIdentity;
use crate::state::GatewayState;

#[derive(Debug, Serialize, ToSchema)]
pub struct ConversationResponse {
    pub id: String,
    pub peer_id: String,
    pub peer_display_name: String,
    pub created_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InboxEntryResponse {
    pub id: String,
    pub peer_id: String,
    pub peer_display_name: String,
    pub last_message_content: Option<String>,
    pub last_message_type: Option<String>,
    pub last_message_at: Option<String>,
    pub unread_count: i64,
    pub created_at: String,
}

impl From<InboxEntry> for InboxEntryResponse {
    fn from(entry: InboxEntry) -> Self {
        Self {
            id: entry.conversation.public_id,
            peer_id: entry.conversation.peer_public_id,
            peer_display_name: entry.conversation.peer_display_name,
            last_message_content: entry.conversation.last_message_content,
            last_message_type: entry.conversation.last_message_type,
            last_message_at: entry.conversation.last_message_at,
            unread_count: entry.unread_count,
            created_at: entry.conversation.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub id: String,
    pub conversation_id: Option<String>,
    pub channel_id: Option<String>,
    pub sender_id: String,
    pub sender_display_name: String,
    pub content: String,
    pub message_type: String,
    pub file_name: Option<String>,
    pub created_at: String,
    pub edited_at: Option<String>,
    pub edited: bool,
}

impl From<MessageRecord> for MessageResponse {
    fn from(record: MessageRecord) -> Self {
        Self {
            id: record.public_id,
            conversation_id: record.conversation_public_id,
            channel_id: record.channel_public_id,
            sender_id: record.sender_public_id,
            sender_display_name: record.sender_display_name,
            content: record.content,
            message_type: record.message_type.to_string(),
            file_name: record.file_name,
            edited: record.edited_at.is_some(),
            created_at: record.created_at,
            edited_at: record.edited_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StartConversationRequest {
    /// Public ID of the other participant
    pub peer_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMessageRequest {
    pub content: String,
    pub message_type: Option<String>,
    pub file_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadResponse {
    /// How many messages this call newly marked as read
    pub marked: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedResponse {
    pub id: String,
}

/// Create conversation routes
pub fn create_conversation_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route(
            "/api/conversations",
            post(start_conversation).get(list_conversations),
        )
        .route(
            "/api/conversations/:conversation_id/messages",
            get(list_messages).post(create_message),
        )
        .route(
            "/api/conversations/:conversation_id/messages/:message_id",
            put(update_message).delete(delete_message),
        )
        .route(
            "/api/conversations/:conversation_id/read",
            post(mark_read),
        )
}

#[utoipa::path(
    post,
    path = "/api/conversations",
    tag = "Conversations",
    request_body = StartConversationRequest,
    responses(
        (status = 201, description = "Conversation created or already existing", body = ConversationResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Peer not found")
    )
)]
pub async fn start_conversation(
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<CallerIdentity>,
    Json(payload): Json<StartConversationRequest>,
) -> GatewayResult<impl IntoResponse> {
    let peer = state
        .users
        .find_by_public_id(&payload.peer_id)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("User not found: {}", payload.peer_id)))?;

    let conversation = state
        .delivery
        .start_conversation(identity.user_id, peer.id)
        .await?;

    let response = ConversationResponse {
        id: conversation.public_id,
        peer_id: peer.public_id,
        peer_display_name: peer.display_name,
        created_at: conversation.created_at,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/conversations",
    tag = "Conversations",
    responses(
        (status = 200, description = "The caller's inbox with unread counts", body = Vec<InboxEntryResponse>)
    )
)]
pub async fn list_conversations(
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<CallerIdentity>,
) -> GatewayResult<Json<Vec<InboxEntryResponse>>> {
    let inbox = state.read_tracker.inbox(identity.user_id).await?;
    Ok(Json(inbox.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/conversations/{conversation_id}/messages",
    tag = "Conversations",
    params(("conversation_id" = String, Path, description = "Conversation public ID")),
    responses(
        (status = 200, description = "Messages in ascending creation order", body = Vec<MessageResponse>),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Conversation not found")
    )
)]
pub async fn list_messages(
    Path(conversation_id): Path<String>,
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<CallerIdentity>,
) -> GatewayResult<Json<Vec<MessageResponse>>> {
    let messages = state
        .delivery
        .list_conversation_messages(&conversation_id, identity.user_id)
        .await?;
    Ok(Json(messages.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/api/conversations/{conversation_id}/messages",
    tag = "Conversations",
    params(("conversation_id" = String, Path, description = "Conversation public ID")),
    request_body = CreateMessageRequest,
    responses(
        (status = 201, description = "Message created and broadcast", body = MessageResponse),
        (status = 400, description = "Invalid content"),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Conversation not found")
    )
)]
pub async fn create_message(
    Path(conversation_id): Path<String>,
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<CallerIdentity>,
    Json(payload): Json<CreateMessageRequest>,
) -> GatewayResult<impl IntoResponse> {
    let message_type = MessageType::from(payload.message_type.as_deref().unwrap_or("text"));

    let message = state
        .delivery
        .send_dm(
            &conversation_id,
            identity.user_id,
            &payload.content,
            message_type,
            payload.file_name.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}

#[utoipa::path(
    put,
    path = "/api/conversations/{conversation_id}/messages/{message_id}",
    tag = "Conversations",
    params(
        ("conversation_id" = String, Path, description = "Conversation public ID"),
        ("message_id" = String, Path, description = "Message public ID")
    ),
    request_body = UpdateMessageRequest,
    responses(
        (status = 200, description = "Message updated and broadcast", body = MessageResponse),
        (status = 403, description = "Not the sender"),
        (status = 404, description = "Message not found")
    )
)]
pub async fn update_message(
    Path((_conversation_id, message_id)): Path<(String, String)>,
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<CallerIdentity>,
    Json(payload): Json<UpdateMessageRequest>,
) -> GatewayResult<Json<MessageResponse>> {
    let message = state
        .delivery
        .edit_message(&message_id, identity.user_id, &payload.content)
        .await?;
    Ok(Json(MessageResponse::from(message)))
}

#[utoipa::path(
    delete,
    path = "/api/conversations/{conversation_id}/messages/{message_id}",
    tag = "Conversations",
    params(
        ("conversation_id" = String, Path, description = "Conversation public ID"),
        ("message_id" = String, Path, description = "Message public ID")
    ),
    responses(
        (status = 200, description = "Message removed, tombstone broadcast", body = DeletedResponse),
        (status = 403, description = "Not the sender"),
        (status = 404, description = "Message not found")
    )
)]
pub async fn delete_message(
    Path((_conversation_id, message_id)): Path<(String, String)>,
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<CallerIdentity>,
) -> GatewayResult<Json<DeletedResponse>> {
    let id = state
        .delivery
        .delete_message(&message_id, identity.user_id)
        .await?;
    Ok(Json(DeletedResponse { id }))
}

#[utoipa::path(
    post,
    path = "/api/conversations/{conversation_id}/read",
    tag = "Conversations",
    params(("conversation_id" = String, Path, description = "Conversation public ID")),
    responses(
        (status = 200, description = "Conversation marked read", body = ReadResponse),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Conversation not found")
    )
)]
pub async fn mark_read(
    Path(conversation_id): Path<String>,
    State(state): State<Arc<GatewayState>>,
    Extension(identity): Extension<CallerIdentity>,
) -> GatewayResult<Json<ReadResponse>> {
    let marked = state
        .read_tracker
        .mark_read(&conversation_id, identity.user_id)
        .await?;
    Ok(Json(ReadResponse { marked }))
}
