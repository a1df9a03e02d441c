//! Repository for per-message read markers.
//!
//! Markers are child rows keyed by (message, user) rather than arrays
//! embedded in the message record, so marking is a set-insert and unread
//! counting is an anti-join.

use crate::types::StoreResult;
use sqlx::{Row, SqlitePool};
use tracing::debug;

/// Repository for read marker database operations
#[derive(Clone)]
pub struct ReadMarkerRepository {
    pool: SqlitePool,
}

impl ReadMarkerRepository {
    /// Create a new read marker repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Mark every message in the conversation authored by someone else as
    /// read by `user_id`. Monotonic and idempotent: re-running once all
    /// messages are marked inserts nothing.
    pub async fn mark_conversation_read(
        &self,
        conversation_id: i64,
        user_id: i64,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            "INSERT INTO message_reads (message_id, user_id, read_at)
             SELECT id, ?, ? FROM messages
             WHERE conversation_id = ? AND sender_id <> ?
             ON CONFLICT (message_id, user_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(conversation_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        let marked = result.rows_affected();
        if marked > 0 {
            debug!(conversation_id, user_id, marked, "marked messages read");
        }
        Ok(marked)
    }

    /// Messages in the conversation authored by others that the viewer has
    /// not yet marked read. Always recomputed, never cached.
    pub async fn unread_count(&self, conversation_id: i64, user_id: i64) -> StoreResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM messages m
             WHERE m.conversation_id = ? AND m.sender_id <> ?
               AND NOT EXISTS (
                   SELECT 1 FROM message_reads r
                   WHERE r.message_id = m.id AND r.user_id = ?
               )",
        )
        .bind(conversation_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.try_get("count")?)
    }

    /// Users who have marked the given message read
    pub async fn readers_of(&self, message_id: i64) -> StoreResult<Vec<i64>> {
        let rows = sqlx::query(
            "SELECT user_id FROM message_reads WHERE message_id = ? ORDER BY user_id ASC",
        )
        .bind(message_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| Ok(row.try_get("user_id")?))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::MessageType;
    use crate::migrations::run_migrations;
    use crate::repos::{ConversationRepository, MessageRepository, UserRepository};

    async fn create_test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    struct Fixture {
        pool: SqlitePool,
        conversation_id: i64,
        alice: i64,
        bob: i64,
    }

    async fn fixture() -> Fixture {
        let pool = create_test_pool().await;
        let users = UserRepository::new(pool.clone());
        let alice = users.create("Alice").await.unwrap().id;
        let bob = users.create("Bob").await.unwrap().id;
        let conversation_id = ConversationRepository::new(pool.clone())
            .create_or_fetch(alice, bob)
            .await
            .unwrap()
            .id;
        Fixture {
            pool,
            conversation_id,
            alice,
            bob,
        }
    }

    #[tokio::test]
    async fn test_mark_read_is_idempotent() {
        let f = fixture().await;
        let messages = MessageRepository::new(f.pool.clone());
        let reads = ReadMarkerRepository::new(f.pool.clone());

        for text in ["hi", "there"] {
            messages
                .create_in_conversation(f.conversation_id, f.alice, text, MessageType::Text, None)
                .await
                .unwrap();
        }

        assert_eq!(reads.unread_count(f.conversation_id, f.bob).await.unwrap(), 2);

        let first = reads
            .mark_conversation_read(f.conversation_id, f.bob)
            .await
            .unwrap();
        assert_eq!(first, 2);
        assert_eq!(reads.unread_count(f.conversation_id, f.bob).await.unwrap(), 0);

        let second = reads
            .mark_conversation_read(f.conversation_id, f.bob)
            .await
            .unwrap();
        assert_eq!(second, 0);
        assert_eq!(reads.unread_count(f.conversation_id, f.bob).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_own_messages_never_count_as_unread() {
        let f = fixture().await;
        let messages = MessageRepository::new(f.pool.clone());
        let reads = ReadMarkerRepository::new(f.pool.clone());

        messages
            .create_in_conversation(f.conversation_id, f.alice, "mine", MessageType::Text, None)
            .await
            .unwrap();

        // Alice authored it: zero for her regardless of marker state
        assert_eq!(reads.unread_count(f.conversation_id, f.alice).await.unwrap(), 0);
        assert_eq!(reads.unread_count(f.conversation_id, f.bob).await.unwrap(), 1);

        // Marking read as the author inserts nothing
        let marked = reads
            .mark_conversation_read(f.conversation_id, f.alice)
            .await
            .unwrap();
        assert_eq!(marked, 0);
    }

    #[tokio::test]
    async fn test_markers_cascade_with_message_delete() {
        let f = fixture().await;
        let messages = MessageRepository::new(f.pool.clone());
        let reads = ReadMarkerRepository::new(f.pool.clone());

        let message = messages
            .create_in_conversation(f.conversation_id, f.alice, "gone soon", MessageType::Text, None)
            .await
            .unwrap();

        reads
            .mark_conversation_read(f.conversation_id, f.bob)
            .await
            .unwrap();
        assert_eq!(reads.readers_of(message.id).await.unwrap(), vec![f.bob]);

        messages.delete(message.id).await.unwrap();
        assert!(reads.readers_of(message.id).await.unwrap().is_empty());
    }
}
