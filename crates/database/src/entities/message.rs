use serde::{Deserialize, Serialize};

/// Rendering type of a message. File and image sends share the text code
/// path; only this tag (plus a display filename) distinguishes them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
    File,
}

impl From<&str> for MessageType {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "image" => MessageType::Image,
            "file" => MessageType::File,
            _ => MessageType::Text,
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MessageType::Text => "text",
            MessageType::Image => "image",
            MessageType::File => "file",
        };
        f.write_str(s)
    }
}

/// A persisted chat message, joined with its sender and room public IDs.
///
/// Exactly one of `conversation_id` / `channel_id` is set. Sender, room,
/// type, and creation time are immutable after creation; only `content`
/// (and the derived `edited_at`) change on edit. Deletion removes the row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Database primary key
    pub id: i64,
    /// Publicly accessible ID
    pub public_id: String,
    /// Owning conversation, for DM messages
    pub conversation_id: Option<i64>,
    pub conversation_public_id: Option<String>,
    /// Owning channel, for channel messages
    pub channel_id: Option<i64>,
    pub channel_public_id: Option<String>,
    /// User who sent the message
    pub sender_id: i64,
    pub sender_public_id: String,
    pub sender_display_name: String,
    /// Message content
    pub content: String,
    /// Rendering type
    pub message_type: MessageType,
    /// Display filename for file/image messages
    pub file_name: Option<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last edit timestamp, if the message was ever edited
    pub edited_at: Option<String>,
}

impl MessageRecord {
    /// Whether this message lives in a direct conversation.
    pub fn is_direct(&self) -> bool {
        self.conversation_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_type_round_trips_through_strings() {
        assert_eq!(MessageType::from("text"), MessageType::Text);
        assert_eq!(MessageType::from("image"), MessageType::Image);
        assert_eq!(MessageType::from("file"), MessageType::File);
        assert_eq!(MessageType::from("unknown"), MessageType::Text);

        assert_eq!(MessageType::Image.to_string(), "image");
        assert_eq!(MessageType::File.to_string(), "file");
    }
}
