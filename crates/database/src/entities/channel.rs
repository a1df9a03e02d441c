use serde::{Deserialize, Serialize};

/// Name of the channel provisioned automatically with every workspace.
/// A channel with this name cannot be deleted or renamed.
pub const GENERAL_CHANNEL_NAME: &str = "general";

/// A workspace chat channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    /// Database primary key
    pub id: i64,
    /// Publicly accessible ID
    pub public_id: String,
    /// Workspace this channel belongs to
    pub workspace_id: String,
    /// Display name, unique within the workspace (case-normalized)
    pub name: String,
    /// User who created the channel
    pub creator_id: i64,
    /// Creation timestamp
    pub created_at: String,
}

impl Channel {
    /// Case-normalized uniqueness key for a channel name.
    pub fn name_key(name: &str) -> String {
        name.trim().to_lowercase()
    }

    /// Whether this is the protected `general` channel.
    pub fn is_general(&self) -> bool {
        Self::name_key(&self.name) == GENERAL_CHANNEL_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_key_normalizes_case_and_whitespace() {
        assert_eq!(Channel::name_key("  General "), "general");
        assert_eq!(Channel::name_key("Dev-Team"), "dev-team");
    }

    #[test]
    fn general_detection() {
        let channel = Channel {
            id: 1,
            public_id: "ch1".to_string(),
            workspace_id: "ws1".to_string(),
            name: "General".to_string(),
            creator_id: 1,
            created_at: "2026-01-01T00:00:00Z".to_string(),
        };
        assert!(channel.is_general());
    }
}
