//! Wire events exchanged over the WebSocket connection.
//!
//! Clients deduplicate by message ID: a message may legitimately arrive
//! both via a live event and a concurrent history fetch.

use huddle_database::MessageRecord;
use serde::{Deserialize, Serialize};

/// Client events received from WebSocket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Heartbeat to keep connection alive
    Ping,
    /// Join a direct conversation room
    JoinConversation { conversation_id: String },
    /// Join a channel room
    JoinChannel { channel_id: String },
    /// Leave a channel room
    LeaveChannel { channel_id: String },
    /// Create and broadcast a DM text message
    SendDmMessage {
        conversation_id: String,
        content: String,
    },
}

/// Server events sent to WebSocket clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Welcome message after successful connection
    Hello { user_id: String },
    /// Heartbeat response
    Pong,
    /// Error response
    Error { error: String, message: String },
    /// Join confirmation for a conversation room
    JoinedConversation { conversation_id: String },
    /// Join confirmation for a channel room
    JoinedChannel { channel_id: String },
    /// Leave confirmation for a channel room
    LeftChannel { channel_id: String },
    /// A DM message was created
    NewMessage { message: MessageView },
    /// A channel message was created
    NewChannelMessage { message: MessageView },
    /// A message's content changed
    EditMessage { message: MessageView },
    /// A DM message was removed; a tombstone, not the full object
    DeleteMessage {
        conversation_id: String,
        message_id: String,
    },
    /// A channel message was removed
    DeleteChannelMessage {
        channel_id: String,
        message_id: String,
    },
}

/// Sender identity as rendered next to a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SenderView {
    pub id: String,
    pub display_name: String,
}

/// Full message object carried by message-bearing events and REST responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageView {
    pub id: String,
    pub conversation_id: Option<String>,
    pub channel_id: Option<String>,
    pub sender: SenderView,
    pub content: String,
    pub message_type: String,
    pub file_name: Option<String>,
    pub created_at: String,
    pub edited_at: Option<String>,
    pub edited: bool,
}

impl From<MessageRecord> for MessageView {
    fn from(record: MessageRecord) -> Self {
        Self {
            id: record.public_id,
            conversation_id: record.conversation_public_id,
            channel_id: record.channel_public_id,
            sender: SenderView {
                id: record.sender_public_id,
                display_name: record.sender_display_name,
            },
            content: record.content,
            message_type: record.message_type.to_string(),
            file_name: record.file_name,
            edited: record.edited_at.is_some(),
            created_at: record.created_at,
            edited_at: record.edited_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_events_parse_from_tagged_json() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"type":"send_dm_message","conversation_id":"c1","content":"hello"}"#,
        )
        .unwrap();

        assert_eq!(
            event,
            ClientEvent::SendDmMessage {
                conversation_id: "c1".to_string(),
                content: "hello".to_string(),
            }
        );
    }

    #[test]
    fn tombstones_serialize_with_only_ids() {
        let event = ServerEvent::DeleteMessage {
            conversation_id: "c1".to_string(),
            message_id: "m1".to_string(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "delete_message");
        assert_eq!(json["message_id"], "m1");
        assert!(json.get("content").is_none());
    }
}
