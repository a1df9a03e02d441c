//! In-memory room registry for live fan-out.
//!
//! Tracks which connections are joined to which rooms. Nothing here is
//! persisted: losing this state loses no data, only live delivery, and
//! clients rebuild it by re-joining on reconnect. Broadcast is always
//! called after a successful persistence step, never before and never in
//! place of it.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::trace;

use crate::types::ServerEvent;

/// Handle for one live WebSocket connection
pub type ConnectionId = u64;

/// The unit of fan-out: a DM conversation or a workspace channel,
/// identified by its public ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoomId {
    Conversation(String),
    Channel(String),
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomId::Conversation(id) => write!(f, "dm:{id}"),
            RoomId::Channel(id) => write!(f, "channel:{id}"),
        }
    }
}

/// Broadcast capability consumed by the delivery coordinator.
///
/// An explicit dependency rather than an ambient global: whoever
/// orchestrates a mutation is handed this and nothing more.
pub trait RoomBroadcaster: Send + Sync {
    /// Deliver `event` to every connection currently joined to `room`.
    /// Fire-and-forget, at most once per currently-connected receiver; a
    /// silently dead connection simply does not receive it.
    fn broadcast(&self, room: &RoomId, event: &ServerEvent);
}

struct ConnectionEntry {
    sender: mpsc::UnboundedSender<ServerEvent>,
    rooms: HashSet<RoomId>,
}

/// Registry of live connections and their room memberships.
///
/// Sharded by room via the concurrent map, so join/leave/broadcast on
/// unrelated rooms never contend on a shared lock.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: DashMap<RoomId, HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>>,
    connections: DashMap<ConnectionId, ConnectionEntry>,
    next_connection_id: AtomicU64,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly accepted connection and its outbound sender.
    pub fn register(&self, sender: mpsc::UnboundedSender<ServerEvent>) -> ConnectionId {
        let connection_id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);
        self.connections.insert(
            connection_id,
            ConnectionEntry {
                sender,
                rooms: HashSet::new(),
            },
        );
        trace!(connection_id, "registered connection");
        connection_id
    }

    /// Add the connection to a room's live set. Idempotent.
    pub fn join(&self, room: RoomId, connection_id: ConnectionId) {
        let Some(mut entry) = self.connections.get_mut(&connection_id) else {
            return;
        };

        let sender = entry.sender.clone();
        entry.rooms.insert(room.clone());
        drop(entry);

        self.rooms
            .entry(room.clone())
            .or_default()
            .insert(connection_id, sender);
        trace!(connection_id, room = %room, "joined room");
    }

    /// Remove the connection from a room's live set. Idempotent.
    pub fn leave(&self, room: &RoomId, connection_id: ConnectionId) {
        if let Some(mut entry) = self.connections.get_mut(&connection_id) {
            entry.rooms.remove(room);
        }
        self.remove_from_room(room, connection_id);
        trace!(connection_id, room = %room, "left room");
    }

    /// Drop the connection from every room it had joined. Called on
    /// disconnect.
    pub fn unregister(&self, connection_id: ConnectionId) {
        let Some((_, entry)) = self.connections.remove(&connection_id) else {
            return;
        };
        for room in &entry.rooms {
            self.remove_from_room(room, connection_id);
        }
        trace!(connection_id, "unregistered connection");
    }

    /// Number of connections currently joined to a room
    pub fn connection_count(&self, room: &RoomId) -> usize {
        self.rooms.get(room).map_or(0, |members| members.len())
    }

    fn remove_from_room(&self, room: &RoomId, connection_id: ConnectionId) {
        if let Some(mut members) = self.rooms.get_mut(room) {
            members.remove(&connection_id);
            if members.is_empty() {
                drop(members);
                self.rooms.remove_if(room, |_, members| members.is_empty());
            }
        }
    }
}

impl RoomBroadcaster for RoomRegistry {
    fn broadcast(&self, room: &RoomId, event: &ServerEvent) {
        let Some(members) = self.rooms.get(room) else {
            // Idle room: the mutation already persisted, there is simply
            // no one to deliver to.
            return;
        };

        let mut delivered = 0usize;
        for sender in members.values() {
            // A closed receiver means the connection died mid-flight; the
            // failure is absorbed, never retried, never surfaced.
            if sender.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }
        trace!(room = %room, delivered, "broadcast event");
    }
}
