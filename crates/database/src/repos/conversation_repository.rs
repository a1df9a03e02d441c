//! Repository for direct conversation data access.

use crate::entities::{Conversation, ConversationListing};
use crate::types::StoreResult;
use sqlx::{Row, SqlitePool};
use tracing::info;

/// Repository for conversation database operations
#[derive(Clone)]
pub struct ConversationRepository {
    pool: SqlitePool,
}

impl ConversationRepository {
    /// Create a new conversation repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Idempotently return the single conversation for an unordered pair of
    /// users, creating it on first contact.
    ///
    /// The UNIQUE constraint on `participant_key` is the arbiter for
    /// concurrent first-contact calls: the losing writer's duplicate-key
    /// failure is resolved by fetching the winner's row.
    pub async fn create_or_fetch(&self, user_a: i64, user_b: i64) -> StoreResult<Conversation> {
        let (low, high) = Conversation::canonical_pair(user_a, user_b);
        let key = Conversation::participant_key(user_a, user_b);

        if let Some(existing) = self.find_by_participant_key(&key).await? {
            return Ok(existing);
        }

        let public_id = cuid2::cuid();
        let now = chrono::Utc::now().to_rfc3339();

        let insert = sqlx::query(
            "INSERT INTO conversations (public_id, user_a_id, user_b_id, participant_key, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(low)
        .bind(high)
        .bind(&key)
        .bind(&now)
        .execute(&self.pool)
        .await;

        match insert {
            Ok(result) => {
                let id = result.last_insert_rowid();
                info!(conversation_id = id, public_id = %public_id, "created conversation");
                Ok(Conversation {
                    id,
                    public_id,
                    user_a_id: low,
                    user_b_id: high,
                    last_message_id: None,
                    created_at: now,
                })
            }
            Err(error) => {
                let store_error = crate::types::StoreError::from(error);
                if store_error.is_unique_violation() {
                    // Lost the create race; the winner's row is authoritative.
                    if let Some(existing) = self.find_by_participant_key(&key).await? {
                        return Ok(existing);
                    }
                }
                Err(store_error)
            }
        }
    }

    /// Find a conversation by the canonical participant key
    pub async fn find_by_participant_key(&self, key: &str) -> StoreResult<Option<Conversation>> {
        let row = sqlx::query(
            "SELECT id, public_id, user_a_id, user_b_id, last_message_id, created_at
             FROM conversations WHERE participant_key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_conversation).transpose()
    }

    /// Find a conversation by its public ID
    pub async fn find_by_public_id(&self, public_id: &str) -> StoreResult<Option<Conversation>> {
        let row = sqlx::query(
            "SELECT id, public_id, user_a_id, user_b_id, last_message_id, created_at
             FROM conversations WHERE public_id = ?",
        )
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_conversation).transpose()
    }

    /// Whether the user is one of the conversation's two participants
    pub async fn is_participant(&self, conversation_id: i64, user_id: i64) -> StoreResult<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM conversations
             WHERE id = ? AND (user_a_id = ? OR user_b_id = ?)",
        )
        .bind(conversation_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let count: i64 = row.try_get("count")?;
        Ok(count > 0)
    }

    /// Point the conversation's back-reference at its newest message
    pub async fn set_last_message(
        &self,
        conversation_id: i64,
        message_id: i64,
    ) -> StoreResult<()> {
        sqlx::query("UPDATE conversations SET last_message_id = ? WHERE id = ?")
            .bind(message_id)
            .bind(conversation_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// List the viewer's conversations for the inbox, newest activity first,
    /// with the peer's identity and the latest message preview joined in.
    pub async fn list_for_user(&self, user_id: i64) -> StoreResult<Vec<ConversationListing>> {
        let rows = sqlx::query(
            "SELECT c.id, c.public_id, c.created_at,
                    peer.public_id AS peer_public_id,
                    peer.display_name AS peer_display_name,
                    m.content AS last_message_content,
                    m.message_type AS last_message_type,
                    m.created_at AS last_message_at
             FROM conversations c
             JOIN users peer
               ON peer.id = CASE WHEN c.user_a_id = ? THEN c.user_b_id ELSE c.user_a_id END
             LEFT JOIN messages m ON m.id = c.last_message_id
             WHERE c.user_a_id = ? OR c.user_b_id = ?
             ORDER BY COALESCE(m.created_at, c.created_at) DESC",
        )
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(ConversationListing {
                    id: row.try_get("id")?,
                    public_id: row.try_get("public_id")?,
                    peer_public_id: row.try_get("peer_public_id")?,
                    peer_display_name: row.try_get("peer_display_name")?,
                    last_message_content: row.try_get("last_message_content")?,
                    last_message_type: row.try_get("last_message_type")?,
                    last_message_at: row.try_get("last_message_at")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }
}

fn map_conversation(row: sqlx::sqlite::SqliteRow) -> StoreResult<Conversation> {
    Ok(Conversation {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        user_a_id: row.try_get("user_a_id")?,
        user_b_id: row.try_get("user_b_id")?,
        last_message_id: row.try_get("last_message_id")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;
    use crate::repos::UserRepository;

    async fn create_test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    async fn seed_users(pool: &SqlitePool) -> (i64, i64) {
        let users = UserRepository::new(pool.clone());
        let a = users.create("Ada").await.unwrap();
        let b = users.create("Brin").await.unwrap();
        (a.id, b.id)
    }

    #[tokio::test]
    async fn test_create_or_fetch_is_idempotent_in_either_order() {
        let pool = create_test_pool().await;
        let (a, b) = seed_users(&pool).await;
        let repo = ConversationRepository::new(pool);

        let first = repo.create_or_fetch(a, b).await.unwrap();
        let second = repo.create_or_fetch(b, a).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.public_id, second.public_id);
    }

    #[tokio::test]
    async fn test_participant_check() {
        let pool = create_test_pool().await;
        let (a, b) = seed_users(&pool).await;
        let repo = ConversationRepository::new(pool);

        let conversation = repo.create_or_fetch(a, b).await.unwrap();
        assert!(repo.is_participant(conversation.id, a).await.unwrap());
        assert!(repo.is_participant(conversation.id, b).await.unwrap());
        assert!(!repo.is_participant(conversation.id, 9999).await.unwrap());
    }

    #[tokio::test]
    async fn test_inbox_listing_shows_peer() {
        let pool = create_test_pool().await;
        let (a, b) = seed_users(&pool).await;
        let repo = ConversationRepository::new(pool.clone());

        repo.create_or_fetch(a, b).await.unwrap();

        let inbox = repo.list_for_user(a).await.unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].peer_display_name, "Brin");
        assert!(inbox[0].last_message_content.is_none());
    }
}
