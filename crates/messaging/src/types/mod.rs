//! Shared types for the messaging core.

pub mod errors;
pub mod events;

pub use errors::{MessagingError, MessagingResult};
pub use events::{ClientEvent, MessageView, SenderView, ServerEvent};
