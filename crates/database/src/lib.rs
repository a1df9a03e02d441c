//! Huddle Database Crate
//!
//! This crate provides persistence for the Huddle messaging core:
//! connection management, migrations, entities, and repository
//! implementations. It is the source of truth for conversations,
//! channels, messages, and read markers; everything in-memory elsewhere
//! (room membership, live connections) is rebuildable and never
//! authoritative.

use sqlx::SqlitePool;

use huddle_config::DatabaseConfig;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::prepare_database;
pub use migrations::run_migrations;

// Re-export repositories
pub use repos::{
    ChannelRepository, ConversationRepository, MessageRepository, ReadMarkerRepository,
    UserRepository,
};

// Re-export entities
pub use entities::{
    Channel, Conversation, ConversationListing, MessageRecord, MessageType, User,
    GENERAL_CHANNEL_NAME,
};

// Re-export types
pub use types::{StoreError, StoreResult};

/// Initialize the database with migrations
pub async fn initialize_database(config: &DatabaseConfig) -> StoreResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| StoreError::Migration(e.to_string()))?;

    run_migrations(&pool)
        .await
        .map_err(|e| StoreError::Migration(e.to_string()))?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_database_initialization() {
        let config = DatabaseConfig {
            url: "sqlite://:memory:".to_string(),
            max_connections: 1,
        };

        let pool = initialize_database(&config).await.unwrap();

        let result: (bool,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert!(result.0);
    }
}
