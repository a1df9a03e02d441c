//! Repository for workspace channel data access.

use crate::entities::{Channel, GENERAL_CHANNEL_NAME};
use crate::types::StoreResult;
use sqlx::{Row, SqlitePool};
use tracing::info;

/// Repository for channel database operations
#[derive(Clone)]
pub struct ChannelRepository {
    pool: SqlitePool,
}

impl ChannelRepository {
    /// Create a new channel repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a channel. The creator becomes its first member.
    ///
    /// Fails with a uniqueness violation when the case-normalized name is
    /// already taken within the workspace.
    pub async fn create(
        &self,
        workspace_id: &str,
        name: &str,
        creator_id: i64,
    ) -> StoreResult<Channel> {
        let public_id = cuid2::cuid();
        let name = name.trim();
        let name_key = Channel::name_key(name);
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO channels (public_id, workspace_id, name, name_key, creator_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&public_id)
        .bind(workspace_id)
        .bind(name)
        .bind(&name_key)
        .bind(creator_id)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let channel_id = result.last_insert_rowid();

        sqlx::query(
            "INSERT INTO channel_members (channel_id, user_id, joined_at) VALUES (?, ?, ?)",
        )
        .bind(channel_id)
        .bind(creator_id)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        info!(
            channel_id,
            public_id = %public_id,
            workspace_id,
            name,
            "created channel"
        );

        Ok(Channel {
            id: channel_id,
            public_id,
            workspace_id: workspace_id.to_string(),
            name: name.to_string(),
            creator_id,
            created_at: now,
        })
    }

    /// Provision the default `general` channel for a freshly registered
    /// workspace. Called by the workspace collaborator, not request handlers.
    pub async fn provision_workspace_defaults(
        &self,
        workspace_id: &str,
        creator_id: i64,
    ) -> StoreResult<Channel> {
        self.create(workspace_id, GENERAL_CHANNEL_NAME, creator_id)
            .await
    }

    /// Find a channel by its public ID
    pub async fn find_by_public_id(&self, public_id: &str) -> StoreResult<Option<Channel>> {
        let row = sqlx::query(
            "SELECT id, public_id, workspace_id, name, creator_id, created_at
             FROM channels WHERE public_id = ?",
        )
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_channel).transpose()
    }

    /// Find a channel by its internal ID
    pub async fn find_by_id(&self, id: i64) -> StoreResult<Option<Channel>> {
        let row = sqlx::query(
            "SELECT id, public_id, workspace_id, name, creator_id, created_at
             FROM channels WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_channel).transpose()
    }

    /// List channels in a workspace, oldest first
    pub async fn list_for_workspace(&self, workspace_id: &str) -> StoreResult<Vec<Channel>> {
        let rows = sqlx::query(
            "SELECT id, public_id, workspace_id, name, creator_id, created_at
             FROM channels WHERE workspace_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(map_channel).collect()
    }

    /// Rename a channel. Returns the number of rows touched.
    pub async fn update_name(&self, channel_id: i64, name: &str) -> StoreResult<u64> {
        let name = name.trim();
        let result = sqlx::query("UPDATE channels SET name = ?, name_key = ? WHERE id = ?")
            .bind(name)
            .bind(Channel::name_key(name))
            .bind(channel_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Remove a channel and, via cascade, its messages and membership rows.
    pub async fn delete(&self, channel_id: i64) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM channels WHERE id = ?")
            .bind(channel_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            info!(channel_id, "deleted channel");
        }
        Ok(result.rows_affected())
    }

    /// Whether the user appears in the channel's member set
    pub async fn is_member(&self, channel_id: i64, user_id: i64) -> StoreResult<bool> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM channel_members WHERE channel_id = ? AND user_id = ?",
        )
        .bind(channel_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let count: i64 = row.try_get("count")?;
        Ok(count > 0)
    }

    /// Add a member. Owned by the membership collaborator; exposed for
    /// provisioning, seeding, and tests.
    pub async fn add_member(&self, channel_id: i64, user_id: i64) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO channel_members (channel_id, user_id, joined_at) VALUES (?, ?, ?)
             ON CONFLICT (channel_id, user_id) DO NOTHING",
        )
        .bind(channel_id)
        .bind(user_id)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn map_channel(row: sqlx::sqlite::SqliteRow) -> StoreResult<Channel> {
    Ok(Channel {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        workspace_id: row.try_get("workspace_id")?,
        name: row.try_get("name")?,
        creator_id: row.try_get("creator_id")?,
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

    #[tokio::test]
    async fn test_create_channel_and_membership() {
        let pool = create_test_pool().await;
        let creator = UserRepository::new(pool.clone())
            .create("Ada")
            .await
            .unwrap();
        let repo = ChannelRepository::new(pool);

        let channel = repo.create("ws1", "Dev Team", creator.id).await.unwrap();
        assert_eq!(channel.name, "Dev Team");
        assert!(repo.is_member(channel.id, creator.id).await.unwrap());
        assert!(!repo.is_member(channel.id, 9999).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected_case_insensitively() {
        let pool = create_test_pool().await;
        let creator = UserRepository::new(pool.clone())
            .create("Ada")
            .await
            .unwrap();
        let repo = ChannelRepository::new(pool);

        repo.create("ws1", "Design", creator.id).await.unwrap();
        let duplicate = repo.create("ws1", "design", creator.id).await;
        assert!(duplicate.err().unwrap().is_unique_violation());

        // Same name in a different workspace is fine
        repo.create("ws2", "Design", creator.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_provisioned_general_channel() {
        let pool = create_test_pool().await;
        let creator = UserRepository::new(pool.clone())
            .create("Ada")
            .await
            .unwrap();
        let repo = ChannelRepository::new(pool);

        let general = repo
            .provision_workspace_defaults("ws1", creator.id)
            .await
            .unwrap();
        assert!(general.is_general());
    }

    #[tokio::test]
    async fn test_add_member_is_idempotent() {
        let pool = create_test_pool().await;
        let users = UserRepository::new(pool.clone());
        let creator = users.create("Ada").await.unwrap();
        let member = users.create("Brin").await.unwrap();
        let repo = ChannelRepository::new(pool);

        let channel = repo.create("ws1", "random", creator.id).await.unwrap();
        repo.add_member(channel.id, member.id).await.unwrap();
        repo.add_member(channel.id, member.id).await.unwrap();
        assert!(repo.is_member(channel.id, member.id).await.unwrap());
    }
}
