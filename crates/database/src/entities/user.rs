use serde::{Deserialize, Serialize};

/// A platform user, as seen by the messaging core.
///
/// Identity issuance and profile management live in the external identity
/// system; this is a read-mostly projection used to resolve caller identity
/// and populate sender display names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Database primary key
    pub id: i64,
    /// Publicly accessible ID
    pub public_id: String,
    /// Display name shown next to messages
    pub display_name: String,
    /// Creation timestamp
    pub created_at: String,
}
