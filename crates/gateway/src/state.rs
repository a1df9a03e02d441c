//! Shared application state for the gateway

use std::sync::Arc;

use sqlx::SqlitePool;

use huddle_config::MessagingConfig;
use huddle_database::UserRepository;
use huddle_messaging::{
    DeliveryService, MembershipGate, MediaCleanup, NoopMediaCleanup, ReadTracker, RoomRegistry,
};

/// Shared application state containing the delivery core and the live
/// room registry. Cheap to clone; everything inside is shared.
#[derive(Clone)]
pub struct GatewayState {
    /// Database connection pool
    pub pool: SqlitePool,
    /// Live connection registry, also the broadcaster handed to delivery
    pub registry: Arc<RoomRegistry>,
    /// The single entry point for every message and channel mutation
    pub delivery: Arc<DeliveryService>,
    /// Read markers and unread counts
    pub read_tracker: Arc<ReadTracker>,
    /// User lookups for identity resolution
    pub users: UserRepository,
}

impl GatewayState {
    /// Wire up the delivery core around a connection pool. The registry
    /// starts empty; clients rebuild their room memberships by joining
    /// after (re)connect.
    pub fn new(pool: SqlitePool, limits: MessagingConfig) -> Self {
        Self::with_media_cleanup(pool, limits, Arc::new(NoopMediaCleanup))
    }

    pub fn with_media_cleanup(
        pool: SqlitePool,
        limits: MessagingConfig,
        media: Arc<dyn MediaCleanup>,
    ) -> Self {
        let registry = Arc::new(RoomRegistry::new());
        let gate = Arc::new(MembershipGate::new(pool.clone()));

        let delivery = Arc::new(DeliveryService::new(
            pool.clone(),
            gate.clone(),
            registry.clone(),
            media,
            limits,
        ));
        let read_tracker = Arc::new(ReadTracker::new(pool.clone(), gate));
        let users = UserRepository::new(pool.clone());

        Self {
            pool,
            registry,
            delivery,
            read_tracker,
            users,
        }
    }
}
