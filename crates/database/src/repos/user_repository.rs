//! Repository for user lookups.
//!
//! Users are owned by the external identity system; the messaging core
//! only reads them, plus a create used by seeding and tests.

use crate::entities::User;
use crate::types::StoreResult;
use sqlx::{Row, SqlitePool};
use tracing::info;

/// Repository for user database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user row. Used by seeding and by the identity collaborator's
    /// sync job; regular request handling never creates users.
    pub async fn create(&self, display_name: &str) -> StoreResult<User> {
        let public_id = cuid2::cuid();
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            "INSERT INTO users (public_id, display_name, created_at) VALUES (?, ?, ?)",
        )
        .bind(&public_id)
        .bind(display_name)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let user_id = result.last_insert_rowid();
        info!(user_id, public_id = %public_id, "created user");

        Ok(User {
            id: user_id,
            public_id,
            display_name: display_name.to_string(),
            created_at: now,
        })
    }

    /// Find a user by its public ID
    pub async fn find_by_public_id(&self, public_id: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, public_id, display_name, created_at FROM users WHERE public_id = ?",
        )
        .bind(public_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_user).transpose()
    }

    /// Find a user by its internal ID
    pub async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let row =
            sqlx::query("SELECT id, public_id, display_name, created_at FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(map_user).transpose()
    }
}

fn map_user(row: sqlx::sqlite::SqliteRow) -> StoreResult<User> {
    Ok(User {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        display_name: row.try_get("display_name")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;

    async fn create_test_pool() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_create_and_find_user() {
        let repo = UserRepository::new(create_test_pool().await);

        let created = repo.create("Ada").await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.display_name, "Ada");

        let by_public = repo
            .find_by_public_id(&created.public_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_public.id, created.id);

        let by_id = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.public_id, created.public_id);
    }

    #[tokio::test]
    async fn test_unknown_user_is_none() {
        let repo = UserRepository::new(create_test_pool().await);
        assert!(repo.find_by_public_id("missing").await.unwrap().is_none());
    }
}
