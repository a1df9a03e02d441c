use serde::{Deserialize, Serialize};

/// A direct (1:1) conversation between two users.
///
/// Participants are stored in canonical order so that the unordered pair
/// {A,B} always resolves to the same row regardless of who initiated.
/// Conversations are created on first contact and never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Database primary key
    pub id: i64,
    /// Publicly accessible ID
    pub public_id: String,
    /// Lower participant ID of the canonical pair
    pub user_a_id: i64,
    /// Higher participant ID of the canonical pair
    pub user_b_id: i64,
    /// Most recent message in the conversation, if any
    pub last_message_id: Option<i64>,
    /// Creation timestamp
    pub created_at: String,
}

impl Conversation {
    /// Order a pair of user IDs canonically.
    pub fn canonical_pair(user_a: i64, user_b: i64) -> (i64, i64) {
        if user_a <= user_b {
            (user_a, user_b)
        } else {
            (user_b, user_a)
        }
    }

    /// Build the unique lookup key for an unordered pair of users.
    pub fn participant_key(user_a: i64, user_b: i64) -> String {
        let (low, high) = Self::canonical_pair(user_a, user_b);
        format!("{low}:{high}")
    }

    /// Whether the given user is one of the two participants.
    pub fn has_participant(&self, user_id: i64) -> bool {
        self.user_a_id == user_id || self.user_b_id == user_id
    }

    /// The other participant from the given viewer's perspective.
    pub fn peer_of(&self, user_id: i64) -> Option<i64> {
        if self.user_a_id == user_id {
            Some(self.user_b_id)
        } else if self.user_b_id == user_id {
            Some(self.user_a_id)
        } else {
            None
        }
    }
}

/// One inbox row: a conversation joined with the viewer's peer and the
/// latest message preview. Unread counts are computed separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationListing {
    pub id: i64,
    pub public_id: String,
    pub peer_public_id: String,
    pub peer_display_name: String,
    pub last_message_content: Option<String>,
    pub last_message_type: Option<String>,
    pub last_message_at: Option<String>,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_key_is_order_independent() {
        assert_eq!(
            Conversation::participant_key(7, 3),
            Conversation::participant_key(3, 7)
        );
        assert_eq!(Conversation::participant_key(3, 7), "3:7");
    }

    #[test]
    fn peer_resolution() {
        let conversation = Conversation {
            id: 1,
            public_id: "c1".to_string(),
            user_a_id: 3,
            user_b_id: 7,
            last_message_id: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        };

        assert_eq!(conversation.peer_of(3), Some(7));
        assert_eq!(conversation.peer_of(7), Some(3));
        assert_eq!(conversation.peer_of(9), None);
        assert!(conversation.has_participant(3));
        assert!(!conversation.has_participant(9));
    }
}
