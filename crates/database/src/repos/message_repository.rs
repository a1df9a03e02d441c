//! Repository for message data access operations.

use crate::entities::{MessageRecord, MessageType};
use crate::types::StoreResult;
use sqlx::{Row, SqlitePool};
use tracing::info;

const SELECT_MESSAGE: &str = "
    SELECT m.id, m.public_id,
           m.conversation_id, c.public_id AS conversation_public_id,
           m.channel_id, ch.public_id AS channel_public_id,
           m.sender_id, u.public_id AS sender_public_id,
           u.display_name AS sender_display_name,
           m.content, m.message_type, m.file_name, m.created_at, m.edited_at
    FROM messages m
    JOIN users u ON u.id = m.sender_id
    LEFT JOIN conversations c ON c.id = m.conversation_id
    LEFT JOIN channels ch ON ch.id = m.channel_id";

/// Repository for message database operations
#[derive(Clone)]
pub struct MessageRepository {
    pool: SqlitePool,
}

impl MessageRepository {
    /// Create a new message repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a direct message
    pub async fn create_in_conversation(
        &self,
        conversation_id: i64,
        sender_id: i64,
        content: &str,
        message_type: MessageType,
        file_name: Option<&str>,
    ) -> StoreResult<MessageRecord> {
        self.create(Some(conversation_id), None, sender_id, content, message_type, file_name)
            .await
    }

    /// Persist a channel message
    pub async fn create_in_channel(
        &self,
        channel_id: i64,
        sender_id: i64,
        content: &str,
        message_type: MessageType,
        file_name: Option<&str>,
    ) -> StoreResult<MessageRecord> {
        self.create(None, Some(channel_id), sender_id, content, message_type, file_name)
            .await
    }

    async fn create(
        &self,
        conversation_id: Option<i64>,
        channel_id: Option<i64>,
        sender_id: i64,
        content: &str,
        message_type: MessageType,
        file_name: Option<&str>,
    ) -> StoreResult<MessageRecord> {
        let public_id = cuid2::cuid();
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO messages
                 (public_id, conversation_id, channel_id, sender_id, content, message_type, file_name, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(conversation_id)
        .bind(channel_id)
        .bind(sender_id)
        .bind(content)
        .bind(message_type.to_string())
        .bind(file_name)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let message_id = result.last_insert_rowid();

        info!(
            message_id,
            public_id = %public_id,
            conversation_id,
            channel_id,
            sender_id,
            "created message"
        );

        // Refetch through the join so the record carries public IDs and the
        // sender's display name.
        self.find_by_id(message_id)
            .await?
            .ok_or(crate::types::StoreError::Database(sqlx::Error::RowNotFound))
    }

    /// Find a message by its internal ID
    pub async fn find_by_id(&self, id: i64) -> StoreResult<Option<MessageRecord>> {
        let query = format!("{SELECT_MESSAGE} WHERE m.id = ?");
        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;
        row.map(map_message).transpose()
    }

    /// Find a message by its public ID
    pub async fn find_by_public_id(&self, public_id: &str) -> StoreResult<Option<MessageRecord>> {
        let query = format!("{SELECT_MESSAGE} WHERE m.public_id = ?");
        let row = sqlx::query(&query)
            .bind(public_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(map_message).transpose()
    }

    /// All messages in a conversation, ascending creation order
    pub async fn list_for_conversation(
        &self,
        conversation_id: i64,
    ) -> StoreResult<Vec<MessageRecord>> {
        let query =
            format!("{SELECT_MESSAGE} WHERE m.conversation_id = ? ORDER BY m.created_at ASC, m.id ASC");
        let rows = sqlx::query(&query)
            .bind(conversation_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(map_message).collect()
    }

    /// All messages in a channel, ascending creation order
    pub async fn list_for_channel(&self, channel_id: i64) -> StoreResult<Vec<MessageRecord>> {
        let query =
            format!("{SELECT_MESSAGE} WHERE m.channel_id = ? ORDER BY m.created_at ASC, m.id ASC");
        let rows = sqlx::query(&query)
            .bind(channel_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(map_message).collect()
    }

    /// Replace a message's content and stamp `edited_at`.
    ///
    /// Returns the number of rows touched; zero means the message no longer
    /// exists (a concurrent delete won, and the caller reports not-found).
    pub async fn update_content(&self, message_id: i64, content: &str) -> StoreResult<u64> {
        let result = sqlx::query("UPDATE messages SET content = ?, edited_at = ? WHERE id = ?")
            .bind(content)
            .bind(chrono::Utc::now().to_rfc3339())
            .bind(message_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Remove a message record. Read markers cascade away with it.
    pub async fn delete(&self, message_id: i64) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(message_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            info!(message_id, "deleted message");
        }
        Ok(result.rows_affected())
    }
}

fn map_message(row: sqlx::sqlite::SqliteRow) -> StoreResult<MessageRecord> {
    let message_type: String = row.try_get("message_type")?;

    Ok(MessageRecord {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        conversation_id: row.try_get("conversation_id")?,
        conversation_public_id: row.try_get("conversation_public_id")?,
        channel_id: row.try_get("channel_id")?,
        channel_public_id: row.try_get("channel_public_id")?,
        sender_id: row.try_get("sender_id")?,
        sender_public_id: row.try_get("sender_public_id")?,
        sender_display_name: row.try_get("sender_display_name")?,
        content: row.try_get("content")?,
        message_type: MessageType::from(message_type.as_str()),
        file_name: row.try_get("file_name")?,
        created_at: row.try_get("created_at")?,
        edited_at: row.try_get("edited_at")?,
    })
}
