//! Persisted entity definitions for the messaging core.

pub mod channel;
pub mod conversation;
pub mod message;
pub mod user;

pub use channel::{Channel, GENERAL_CHANNEL_NAME};
pub use conversation::{Conversation, ConversationListing};
pub use message::{MessageRecord, MessageType};
pub use user::User;
