//! The reservation engine facade.

use crate::bookings::BookingManager;
use crate::catalog::StoreCatalog;
use crate::db::{Database, DatabaseSnapshot, TableKind};
use crate::error::Result;
use crate::session::Identity;
use crate::slots::{AdjustOutcome, SlotEngine};
use crate::types::{
    Booking, BookingId, BookingRequest, EngineStats, NewUser, Review, Session, Slot, SlotId,
    Store, StoreId, StoreSeed, UserId,
};
use crate::watch::{WatchConfig, WatchHandle, WatchKey, WatchManager, WatchValue};
use std::sync::Arc;
use tracing::{error, info};

/// The reservation engine.
///
/// Provides a unified interface for:
/// - Seeding and browsing the store catalog
/// - Atomic slot availability mutations
/// - Booking lifecycle management
/// - Credential login and registration
/// - Keyed live queries over all of the above
///
/// All operations are safe to call concurrently from any thread. The
/// dataset lives in memory; [`Engine::snapshot`] and
/// [`Engine::load_snapshot`] exchange it with whatever owns durability.
pub struct Engine {
    db: Arc<Database>,
    watches: Arc<WatchManager>,
    slots: SlotEngine,
    bookings: BookingManager,
    catalog: StoreCatalog,
    identity: Identity,
}

impl Engine {
    pub fn new() -> Self {
        let db = Arc::new(Database::new());
        let watches = Arc::new(WatchManager::new(db.clone()));
        let slots = SlotEngine::new(db.clone(), watches.clone());
        let bookings = BookingManager::new(db.clone(), watches.clone(), slots.clone());
        let catalog = StoreCatalog::new(db.clone(), watches.clone());
        let identity = Identity::new(db.clone(), watches.clone());
        info!("engine ready");
        Self {
            db,
            watches,
            slots,
            bookings,
            catalog,
            identity,
        }
    }

    // --- Components ---

    /// The slot availability engine. Cheap to clone into worker threads.
    pub fn slots(&self) -> &SlotEngine {
        &self.slots
    }

    /// The booking lifecycle manager.
    pub fn bookings(&self) -> &BookingManager {
        &self.bookings
    }

    /// The store catalog.
    pub fn catalog(&self) -> &StoreCatalog {
        &self.catalog
    }

    /// Login and registration.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The watch manager behind every live query.
    pub fn watches(&self) -> &WatchManager {
        &self.watches
    }

    // --- Session Operations ---

    pub fn login(&self, username: &str, password: &str) -> Result<Session> {
        self.identity.login(username, password)
    }

    pub fn register(&self, profile: NewUser) -> Result<Session> {
        self.identity.register(profile)
    }

    // --- Catalog Operations ---

    pub fn add_store(&self, seed: StoreSeed) -> Result<Store> {
        self.catalog.add_store(seed)
    }

    pub fn stores(&self) -> Vec<Store> {
        self.catalog.stores()
    }

    pub fn store(&self, id: StoreId) -> Result<Option<Store>> {
        self.catalog.store(id)
    }

    pub fn submit_review(
        &self,
        store: StoreId,
        user: UserId,
        rating: u8,
        comment: impl Into<String>,
    ) -> Result<Review> {
        self.catalog.submit_review(store, user, rating, comment)
    }

    pub fn reviews_for_store(&self, store: StoreId) -> Result<Vec<Review>> {
        self.catalog.reviews_for_store(store)
    }

    // --- Slot Operations ---

    pub fn slots_for_store(&self, store: StoreId) -> Result<Vec<Slot>> {
        self.slots.slots_for_store(store)
    }

    pub fn reduce_availability(
        &self,
        store: StoreId,
        hour: &str,
        amount: u32,
    ) -> Result<AdjustOutcome> {
        self.slots.reduce_availability(store, hour, amount)
    }

    pub fn increase_availability(&self, slot: SlotId, amount: u32) -> Result<AdjustOutcome> {
        self.slots.increase_availability(slot, amount)
    }

    // --- Booking Operations ---

    pub fn create_booking(&self, request: BookingRequest) -> Result<Booking> {
        self.bookings.create_booking(request)
    }

    pub fn delete_booking(&self, id: BookingId) -> Result<Option<Booking>> {
        self.bookings.delete_booking(id)
    }

    pub fn delete_all_bookings(&self) -> usize {
        self.bookings.delete_all_bookings()
    }

    pub fn bookings_for_user(&self, user: UserId) -> Result<Vec<Booking>> {
        self.bookings.bookings_for_user(user)
    }

    // --- Watch Operations ---

    /// Start a live query on any key.
    pub fn watch(&self, key: WatchKey) -> Result<WatchHandle> {
        self.watches.subscribe(key, WatchConfig::default())
    }

    /// Start a live query with an explicit buffer size.
    pub fn watch_with(&self, key: WatchKey, config: WatchConfig) -> Result<WatchHandle> {
        self.watches.subscribe(key, config)
    }

    /// Peek a key's last observed value without subscribing.
    pub fn last_value(&self, key: &WatchKey) -> Option<WatchValue> {
        self.watches.last_value(key)
    }

    // --- Engine Operations ---

    /// Row counts and the latest commit sequence.
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            user_count: self.db.users().len() as u64,
            store_count: self.db.stores().len() as u64,
            slot_count: self.db.slots().len() as u64,
            booking_count: self.db.bookings().len() as u64,
            review_count: self.db.reviews().len() as u64,
            last_committed: self.db.last_committed(),
        }
    }

    /// Export the whole dataset.
    pub fn snapshot(&self) -> DatabaseSnapshot {
        self.db.dump()
    }

    /// Replace the whole dataset from a snapshot and wake every watcher.
    pub fn load_snapshot(&self, snapshot: DatabaseSnapshot) -> Result<()> {
        self.db.restore(snapshot)?;
        for kind in [
            TableKind::Users,
            TableKind::Stores,
            TableKind::Slots,
            TableKind::Bookings,
            TableKind::Reviews,
        ] {
            self.watches.table_changed(kind);
        }
        info!("snapshot loaded");
        Ok(())
    }

    /// [`Engine::snapshot`] as a JSON string.
    pub fn snapshot_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    /// [`Engine::load_snapshot`] from a JSON string.
    pub fn load_snapshot_json(&self, json: &str) -> Result<()> {
        let snapshot: DatabaseSnapshot = serde_json::from_str(json).map_err(|e| {
            error!(error = %e, "snapshot decode failed");
            e
        })?;
        self.load_snapshot(snapshot)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
