//! Error types for the persistence layer.

use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Error type for the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(String),
}

impl StoreError {
    /// Whether this error was caused by a uniqueness constraint.
    ///
    /// Callers use this to resolve create races (for example two clients
    /// starting the same conversation at once) by fetching the winner's row.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StoreError::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_unique_violations() {
        let error = StoreError::Migration("boom".to_string());
        assert!(!error.is_unique_violation());

        let error = StoreError::Database(sqlx::Error::RowNotFound);
        assert!(!error.is_unique_violation());
    }
}
