//! Delivery coordinator: validate → persist → fan-out → acknowledge.
//!
//! Every mutating operation runs the same sequence regardless of whether
//! it arrived over REST or a socket event, so validation and broadcast
//! semantics cannot drift between transports. The store mutation is never
//! rolled back on broadcast failure: an offline viewer simply sees the
//! change on the next history fetch.

use std::sync::Arc;

use sqlx::SqlitePool;

use huddle_config::MessagingConfig;
use huddle_database::{
    Channel, ChannelRepository, Conversation, ConversationRepository, MessageRecord,
    MessageRepository, MessageType,
};

use crate::access::AccessGate;
use crate::media::{schedule_cleanup, MediaCleanup};
use crate::registry::{RoomBroadcaster, RoomId};
use crate::types::{MessageView, MessagingError, MessagingResult, ServerEvent};

const MAX_CHANNEL_NAME_LENGTH: usize = 80;

/// Orchestrates message and channel mutations across the access gate,
/// the store, and the room registry, in that order.
pub struct DeliveryService {
    conversations: ConversationRepository,
    channels: ChannelRepository,
    messages: MessageRepository,
    gate: Arc<dyn AccessGate>,
    broadcaster: Arc<dyn RoomBroadcaster>,
    media: Arc<dyn MediaCleanup>,
    limits: MessagingConfig,
}

impl DeliveryService {
    pub fn new(
        pool: SqlitePool,
        gate: Arc<dyn AccessGate>,
        broadcaster: Arc<dyn RoomBroadcaster>,
        media: Arc<dyn MediaCleanup>,
        limits: MessagingConfig,
    ) -> Self {
        Self {
            conversations: ConversationRepository::new(pool.clone()),
            channels: ChannelRepository::new(pool.clone()),
            messages: MessageRepository::new(pool),
            gate,
            broadcaster,
            media,
            limits,
        }
    }

    /// Start (or return) the single conversation between two users.
    ///
    /// Idempotent in either argument order; a create race resolves to the
    /// winner's row inside the repository and is never surfaced.
    pub async fn start_conversation(
        &self,
        user_a: i64,
        user_b: i64,
    ) -> MessagingResult<Conversation> {
        if user_a == user_b {
            return Err(MessagingError::validation(
                "cannot start a conversation with yourself",
            ));
        }
        Ok(self.conversations.create_or_fetch(user_a, user_b).await?)
    }

    /// Create a DM message, then fan it out to the conversation room.
    pub async fn send_dm(
        &self,
        conversation_public_id: &str,
        sender_id: i64,
        content: &str,
        message_type: MessageType,
        file_name: Option<&str>,
    ) -> MessagingResult<MessageRecord> {
        let conversation = self.require_conversation(conversation_public_id).await?;
        if !self.gate.is_participant(conversation.id, sender_id).await? {
            return Err(MessagingError::forbidden(
                "you are not a participant of this conversation",
            ));
        }
        self.validate_message(content, message_type, file_name)?;

        let message = self
            .messages
            .create_in_conversation(conversation.id, sender_id, content, message_type, file_name)
            .await?;
        self.conversations
            .set_last_message(conversation.id, message.id)
            .await?;

        self.broadcaster.broadcast(
            &RoomId::Conversation(conversation.public_id),
            &ServerEvent::NewMessage {
                message: MessageView::from(message.clone()),
            },
        );
        Ok(message)
    }

    /// Create a channel message, then fan it out to the channel room.
    pub async fn send_channel_message(
        &self,
        channel_public_id: &str,
        sender_id: i64,
        content: &str,
        message_type: MessageType,
        file_name: Option<&str>,
    ) -> MessagingResult<MessageRecord> {
        let channel = self.require_channel(channel_public_id).await?;
        if !self.gate.is_channel_member(channel.id, sender_id).await? {
            return Err(MessagingError::forbidden(
                "you are not a member of this channel",
            ));
        }
        self.validate_message(content, message_type, file_name)?;

        let message = self
            .messages
            .create_in_channel(channel.id, sender_id, content, message_type, file_name)
            .await?;

        self.broadcaster.broadcast(
            &RoomId::Channel(channel.public_id),
            &ServerEvent::NewChannelMessage {
                message: MessageView::from(message.clone()),
            },
        );
        Ok(message)
    }

    /// Replace a message's content. Sender-only; type and room never change.
    pub async fn edit_message(
        &self,
        message_public_id: &str,
        editor_id: i64,
        new_content: &str,
    ) -> MessagingResult<MessageRecord> {
        let message = self.require_message(message_public_id).await?;
        if message.sender_id != editor_id {
            return Err(MessagingError::forbidden(
                "only the sender may edit a message",
            ));
        }
        self.check_room_access(&message, editor_id).await?;

        let trimmed = new_content.trim();
        if trimmed.is_empty() {
            return Err(MessagingError::validation("message content cannot be empty"));
        }
        self.check_content_length(new_content)?;

        // Zero rows means a concurrent delete won; the record stays gone.
        let touched = self.messages.update_content(message.id, new_content).await?;
        if touched == 0 {
            return Err(MessagingError::message_not_found(message_public_id));
        }

        let updated = self
            .messages
            .find_by_id(message.id)
            .await?
            .ok_or_else(|| MessagingError::message_not_found(message_public_id))?;

        self.broadcaster.broadcast(
            &room_of(&updated),
            &ServerEvent::EditMessage {
                message: MessageView::from(updated.clone()),
            },
        );
        Ok(updated)
    }

    /// Remove a message and broadcast its tombstone. Terminal: later edits
    /// and deletes of the same ID observe not-found.
    pub async fn delete_message(
        &self,
        message_public_id: &str,
        requester_id: i64,
    ) -> MessagingResult<String> {
        let message = self.require_message(message_public_id).await?;
        if message.sender_id != requester_id {
            return Err(MessagingError::forbidden(
                "only the sender may delete a message",
            ));
        }
        self.check_room_access(&message, requester_id).await?;

        let removed = self.messages.delete(message.id).await?;
        if removed == 0 {
            return Err(MessagingError::message_not_found(message_public_id));
        }

        let tombstone = match (&message.conversation_public_id, &message.channel_public_id) {
            (Some(conversation_id), _) => ServerEvent::DeleteMessage {
                conversation_id: conversation_id.clone(),
                message_id: message.public_id.clone(),
            },
            (None, Some(channel_id)) => ServerEvent::DeleteChannelMessage {
                channel_id: channel_id.clone(),
                message_id: message.public_id.clone(),
            },
            (None, None) => {
                return Err(MessagingError::internal("message belongs to no room"));
            }
        };
        self.broadcaster.broadcast(&room_of(&message), &tombstone);

        // The row is gone; stored media disappears on its own schedule.
        if let Some(file_name) = message.file_name {
            schedule_cleanup(self.media.clone(), file_name);
        }
        Ok(message.public_id)
    }

    /// Resolve a conversation and confirm the user may act in it. Used
    /// for history fetches and for room joins.
    pub async fn authorize_conversation(
        &self,
        conversation_public_id: &str,
        user_id: i64,
    ) -> MessagingResult<Conversation> {
        let conversation = self.require_conversation(conversation_public_id).await?;
        if !self.gate.is_participant(conversation.id, user_id).await? {
            return Err(MessagingError::forbidden(
                "you are not a participant of this conversation",
            ));
        }
        Ok(conversation)
    }

    /// Resolve a channel and confirm the user may act in it.
    pub async fn authorize_channel(
        &self,
        channel_public_id: &str,
        user_id: i64,
    ) -> MessagingResult<Channel> {
        let channel = self.require_channel(channel_public_id).await?;
        if !self.gate.is_channel_member(channel.id, user_id).await? {
            return Err(MessagingError::forbidden(
                "you are not a member of this channel",
            ));
        }
        Ok(channel)
    }

    /// All messages in a conversation, ascending creation order.
    pub async fn list_conversation_messages(
        &self,
        conversation_public_id: &str,
        viewer_id: i64,
    ) -> MessagingResult<Vec<MessageRecord>> {
        let conversation = self
            .authorize_conversation(conversation_public_id, viewer_id)
            .await?;
        Ok(self.messages.list_for_conversation(conversation.id).await?)
    }

    /// All messages in a channel, ascending creation order.
    pub async fn list_channel_messages(
        &self,
        channel_public_id: &str,
        viewer_id: i64,
    ) -> MessagingResult<Vec<MessageRecord>> {
        let channel = self.authorize_channel(channel_public_id, viewer_id).await?;
        Ok(self.messages.list_for_channel(channel.id).await?)
    }

    /// Create a channel in a workspace. Names are unique per workspace
    /// after case normalization.
    pub async fn create_channel(
        &self,
        workspace_id: &str,
        name: &str,
        creator_id: i64,
    ) -> MessagingResult<Channel> {
        validate_channel_name(name)?;

        match self.channels.create(workspace_id, name, creator_id).await {
            Ok(channel) => Ok(channel),
            Err(error) if error.is_unique_violation() => Err(MessagingError::validation(
                "a channel with this name already exists in the workspace",
            )),
            Err(error) => Err(error.into()),
        }
    }

    /// Rename a channel. The provisioned `general` channel keeps its name
    /// so the deletion protection cannot be renamed away.
    pub async fn rename_channel(
        &self,
        channel_public_id: &str,
        requester_id: i64,
        new_name: &str,
    ) -> MessagingResult<Channel> {
        let channel = self.require_channel(channel_public_id).await?;
        if self.gate.is_general_channel(channel.id).await? {
            return Err(MessagingError::forbidden(
                "the general channel cannot be renamed",
            ));
        }
        if !self.gate.is_channel_member(channel.id, requester_id).await? {
            return Err(MessagingError::forbidden(
                "you are not a member of this channel",
            ));
        }
        validate_channel_name(new_name)?;

        match self.channels.update_name(channel.id, new_name).await {
            Ok(0) => Err(MessagingError::channel_not_found(channel_public_id)),
            Ok(_) => self.require_channel(channel_public_id).await,
            Err(error) if error.is_unique_violation() => Err(MessagingError::validation(
                "a channel with this name already exists in the workspace",
            )),
            Err(error) => Err(error.into()),
        }
    }

    /// Delete a channel and its messages. Rejected for `general`
    /// regardless of the requester.
    pub async fn delete_channel(
        &self,
        channel_public_id: &str,
        requester_id: i64,
    ) -> MessagingResult<String> {
        let channel = self.require_channel(channel_public_id).await?;
        if self.gate.is_general_channel(channel.id).await? {
            return Err(MessagingError::forbidden(
                "the general channel cannot be deleted",
            ));
        }
        if !self.gate.is_channel_member(channel.id, requester_id).await? {
            return Err(MessagingError::forbidden(
                "you are not a member of this channel",
            ));
        }

        let removed = self.channels.delete(channel.id).await?;
        if removed == 0 {
            return Err(MessagingError::channel_not_found(channel_public_id));
        }
        Ok(channel.public_id)
    }

    async fn require_conversation(&self, public_id: &str) -> MessagingResult<Conversation> {
        self.conversations
            .find_by_public_id(public_id)
            .await?
            .ok_or_else(|| MessagingError::conversation_not_found(public_id))
    }

    async fn require_channel(&self, public_id: &str) -> MessagingResult<Channel> {
        self.channels
            .find_by_public_id(public_id)
            .await?
            .ok_or_else(|| MessagingError::channel_not_found(public_id))
    }

    async fn require_message(&self, public_id: &str) -> MessagingResult<MessageRecord> {
        self.messages
            .find_by_public_id(public_id)
            .await?
            .ok_or_else(|| MessagingError::message_not_found(public_id))
    }

    async fn check_room_access(
        &self,
        message: &MessageRecord,
        user_id: i64,
    ) -> MessagingResult<()> {
        let allowed = match (message.conversation_id, message.channel_id) {
            (Some(conversation_id), _) => {
                self.gate.is_participant(conversation_id, user_id).await?
            }
            (None, Some(channel_id)) => self.gate.is_channel_member(channel_id, user_id).await?,
            (None, None) => false,
        };
        if allowed {
            Ok(())
        } else {
            Err(MessagingError::forbidden("no access to this room"))
        }
    }

    fn validate_message(
        &self,
        content: &str,
        message_type: MessageType,
        file_name: Option<&str>,
    ) -> MessagingResult<()> {
        match message_type {
            MessageType::Text => {
                if content.trim().is_empty() {
                    return Err(MessagingError::validation("message content cannot be empty"));
                }
            }
            MessageType::Image | MessageType::File => {
                if !file_name.map(str::trim).is_some_and(|name| !name.is_empty()) {
                    return Err(MessagingError::validation(
                        "file messages require an attached file reference",
                    ));
                }
            }
        }
        self.check_content_length(content)
    }

    fn check_content_length(&self, content: &str) -> MessagingResult<()> {
        if content.len() > self.limits.max_content_length {
            return Err(MessagingError::validation(format!(
                "message content too long (max {} bytes)",
                self.limits.max_content_length
            )));
        }
        Ok(())
    }
}

fn validate_channel_name(name: &str) -> MessagingResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(MessagingError::validation("channel name cannot be empty"));
    }
    if trimmed.len() > MAX_CHANNEL_NAME_LENGTH {
        return Err(MessagingError::validation(format!(
            "channel name too long (max {MAX_CHANNEL_NAME_LENGTH} characters)"
        )));
    }
    Ok(())
}

/// The fan-out room a persisted message belongs to.
fn room_of(message: &MessageRecord) -> RoomId {
    match (&message.conversation_public_id, &message.channel_public_id) {
        (Some(conversation_id), _) => RoomId::Conversation(conversation_id.clone()),
        (_, Some(channel_id)) => RoomId::Channel(channel_id.clone()),
        // Unreachable for rows satisfying the schema's room check
        (None, None) => RoomId::Conversation(String::new()),
    }
}
