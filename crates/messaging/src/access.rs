//! Access gate: the consumed authorization interface.
//!
//! Membership administration belongs to an external collaborator; the
//! messaging core only asks yes/no questions through this trait before
//! every join, send, edit, and delete. A negative answer means
//! `Forbidden` and no state mutation.

use async_trait::async_trait;
use sqlx::SqlitePool;

use huddle_database::{Channel, ChannelRepository, ConversationRepository};

use crate::types::MessagingResult;

/// Authorization questions the messaging core asks before acting.
#[async_trait]
pub trait AccessGate: Send + Sync {
    /// Is the user one of the conversation's two participants?
    async fn is_participant(&self, conversation_id: i64, user_id: i64) -> MessagingResult<bool>;

    /// Is the user in the channel's member set?
    async fn is_channel_member(&self, channel_id: i64, user_id: i64) -> MessagingResult<bool>;

    /// Is this the protected `general` channel? Used to veto deletion.
    async fn is_general_channel(&self, channel_id: i64) -> MessagingResult<bool>;
}

/// SQL-backed gate reading the collaborator-owned membership tables.
pub struct MembershipGate {
    conversations: ConversationRepository,
    channels: ChannelRepository,
}

impl MembershipGate {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            conversations: ConversationRepository::new(pool.clone()),
            channels: ChannelRepository::new(pool),
        }
    }
}

#[async_trait]
impl AccessGate for MembershipGate {
    async fn is_participant(&self, conversation_id: i64, user_id: i64) -> MessagingResult<bool> {
        Ok(self
            .conversations
            .is_participant(conversation_id, user_id)
            .await?)
    }

    async fn is_channel_member(&self, channel_id: i64, user_id: i64) -> MessagingResult<bool> {
        Ok(self.channels.is_member(channel_id, user_id).await?)
    }

    async fn is_general_channel(&self, channel_id: i64) -> MessagingResult<bool> {
        let channel = self.channels.find_by_id(channel_id).await?;
        Ok(channel.as_ref().is_some_and(Channel::is_general))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_database::{run_migrations, UserRepository};

    async fn create_test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn gate_answers_from_membership_tables() {
        let pool = create_test_pool().await;
        let users = UserRepository::new(pool.clone());
        let alice = users.create("Alice").await.unwrap().id;
        let bob = users.create("Bob").await.unwrap().id;
        let carol = users.create("Carol").await.unwrap().id;

        let conversation = ConversationRepository::new(pool.clone())
            .create_or_fetch(alice, bob)
            .await
            .unwrap();
        let channels = ChannelRepository::new(pool.clone());
        let general = channels
            .provision_workspace_defaults("ws1", alice)
            .await
            .unwrap();
        let side = channels.create("ws1", "side", alice).await.unwrap();

        let gate = MembershipGate::new(pool);

        assert!(gate.is_participant(conversation.id, alice).await.unwrap());
        assert!(!gate.is_participant(conversation.id, carol).await.unwrap());

        assert!(gate.is_channel_member(general.id, alice).await.unwrap());
        assert!(!gate.is_channel_member(general.id, bob).await.unwrap());

        assert!(gate.is_general_channel(general.id).await.unwrap());
        assert!(!gate.is_general_channel(side.id).await.unwrap());
    }
}
