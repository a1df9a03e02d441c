//! Repository implementations for the messaging store.

pub mod channel_repository;
pub mod conversation_repository;
pub mod message_repository;
pub mod read_marker_repository;
pub mod user_repository;

pub use channel_repository::ChannelRepository;
pub use conversation_repository::ConversationRepository;
pub use message_repository::MessageRepository;
pub use read_marker_repository::ReadMarkerRepository;
pub use user_repository::UserRepository;
