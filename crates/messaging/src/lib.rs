//! Huddle Messaging Crate
//!
//! The real-time delivery core: DM conversations, workspace channels,
//! message lifecycle, room fan-out, and read tracking. Transports
//! (REST handlers, socket handlers) call into the same
//! [`DeliveryService`] entry points so both surfaces share one
//! validation, persistence, and broadcast path.

pub mod access;
pub mod delivery;
pub mod media;
pub mod read_tracker;
pub mod registry;
pub mod types;

pub use access::{AccessGate, MembershipGate};
pub use delivery::DeliveryService;
pub use media::{MediaCleanup, NoopMediaCleanup};
pub use read_tracker::{InboxEntry, ReadTracker};
pub use registry::{ConnectionId, RoomBroadcaster, RoomId, RoomRegistry};
pub use types::{ClientEvent, MessageView, MessagingError, MessagingResult, SenderView, ServerEvent};
