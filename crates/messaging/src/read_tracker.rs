//! Per-user read tracking and unread counts.

use std::sync::Arc;

use serde::Serialize;
use sqlx::SqlitePool;

use huddle_database::{ConversationListing, ConversationRepository, ReadMarkerRepository};

use crate::access::AccessGate;
use crate::types::{MessagingError, MessagingResult};

/// One row of the viewer's inbox: a conversation plus its freshly
/// computed unread count.
#[derive(Debug, Clone, Serialize)]
pub struct InboxEntry {
    #[serde(flatten)]
    pub conversation: ConversationListing,
    pub unread_count: i64,
}

/// Maintains read markers and derives unread counts.
///
/// Counts are recomputed on every inbox listing rather than cached, so
/// they self-heal from any transient inconsistency.
pub struct ReadTracker {
    conversations: ConversationRepository,
    reads: ReadMarkerRepository,
    gate: Arc<dyn AccessGate>,
}

impl ReadTracker {
    pub fn new(pool: SqlitePool, gate: Arc<dyn AccessGate>) -> Self {
        Self {
            conversations: ConversationRepository::new(pool.clone()),
            reads: ReadMarkerRepository::new(pool),
            gate,
        }
    }

    /// Mark every message from others in the conversation as read by the
    /// viewer. Monotonic and idempotent; returns how many markers were
    /// newly added.
    pub async fn mark_read(
        &self,
        conversation_public_id: &str,
        viewer_id: i64,
    ) -> MessagingResult<u64> {
        let conversation = self
            .conversations
            .find_by_public_id(conversation_public_id)
            .await?
            .ok_or_else(|| MessagingError::conversation_not_found(conversation_public_id))?;

        if !self.gate.is_participant(conversation.id, viewer_id).await? {
            return Err(MessagingError::forbidden(
                "you are not a participant of this conversation",
            ));
        }

        Ok(self
            .reads
            .mark_conversation_read(conversation.id, viewer_id)
            .await?)
    }

    /// Unread count for one conversation from the viewer's perspective.
    /// The viewer's own messages never contribute.
    pub async fn unread_count(
        &self,
        conversation_id: i64,
        viewer_id: i64,
    ) -> MessagingResult<i64> {
        Ok(self.reads.unread_count(conversation_id, viewer_id).await?)
    }

    /// The viewer's inbox: all conversations with computed unread counts,
    /// most recent activity first.
    pub async fn inbox(&self, viewer_id: i64) -> MessagingResult<Vec<InboxEntry>> {
        let listings = self.conversations.list_for_user(viewer_id).await?;

        let mut entries = Vec::with_capacity(listings.len());
        for conversation in listings {
            let unread_count = self.reads.unread_count(conversation.id, viewer_id).await?;
            entries.push(InboxEntry {
                conversation,
                unread_count,
            });
        }
        Ok(entries)
    }
}
