//! Store catalog: seeding, browsing, reviews.

use crate::db::{Database, TableKind};
use crate::error::{EngineError, Result};
use crate::types::{Review, ReviewId, Slot, SlotId, Store, StoreId, StoreSeed, Timestamp, UserId};
use crate::watch::{WatchConfig, WatchHandle, WatchKey, WatchManager};
use std::sync::Arc;
use tracing::{debug, info};

/// Browsing and seeding surface for stores and their reviews.
#[derive(Clone)]
pub struct StoreCatalog {
    db: Arc<Database>,
    watches: Arc<WatchManager>,
}

impl StoreCatalog {
    pub(crate) fn new(db: Arc<Database>, watches: Arc<WatchManager>) -> Self {
        Self { db, watches }
    }

    // --- Seeding ---

    /// Insert a store and one slot row per offered hour, each seeded with
    /// that hour's capacity.
    pub fn add_store(&self, seed: StoreSeed) -> Result<Store> {
        let store = Store {
            id: StoreId(0),
            name: seed.name,
            info: seed.info,
            location: seed.location,
            hours: seed.hours.clone(),
        };
        let (store, _) = self.db.stores().insert(store)?;
        self.watches.table_changed(TableKind::Stores);

        for hour in &seed.hours {
            self.db.slots().insert(Slot {
                id: SlotId(0),
                store: store.id,
                hour: hour.hour.clone(),
                availability: hour.capacity,
            })?;
        }
        if !seed.hours.is_empty() {
            // One notification for the whole batch.
            self.watches.table_changed(TableKind::Slots);
        }

        info!(store = %store.id, name = %store.name, hours = seed.hours.len(), "store seeded");
        Ok(store)
    }

    // --- Browsing ---

    /// Every store row, in key order.
    pub fn stores(&self) -> Vec<Store> {
        self.db.stores().all()
    }

    /// Point read of one store.
    pub fn store(&self, id: StoreId) -> Result<Option<Store>> {
        if !id.is_valid() {
            return Err(EngineError::InvalidId(id.0));
        }
        Ok(self.db.stores().get(id.0))
    }

    /// All rows sharing one display name.
    pub fn stores_named(&self, name: &str) -> Vec<Store> {
        self.db.stores().scan(|s| s.name == name)
    }

    /// Deduplicated hour labels across every row with this name, in
    /// first-seen order. This is how same-named rows present as a single
    /// venue.
    pub fn hours_for_name(&self, name: &str) -> Vec<String> {
        let mut hours: Vec<String> = Vec::new();
        for store in self.stores_named(name) {
            for hour in store.hours {
                if !hours.contains(&hour.hour) {
                    hours.push(hour.hour);
                }
            }
        }
        hours
    }

    // --- Watches ---

    /// Live query over one store's display name.
    pub fn watch_name(&self, store: StoreId) -> Result<WatchHandle> {
        self.watches
            .subscribe(WatchKey::store_name(store), WatchConfig::default())
    }

    /// Live query over one store's location.
    pub fn watch_location(&self, store: StoreId) -> Result<WatchHandle> {
        self.watches
            .subscribe(WatchKey::store_location(store), WatchConfig::default())
    }

    /// Live query over the whole catalog.
    pub fn watch_all(&self) -> Result<WatchHandle> {
        self.watches
            .subscribe(WatchKey::store_list(), WatchConfig::default())
    }

    // --- Reviews ---

    /// Record a rating (1 to 5) with a free-form comment.
    pub fn submit_review(
        &self,
        store: StoreId,
        user: UserId,
        rating: u8,
        comment: impl Into<String>,
    ) -> Result<Review> {
        if !(1..=5).contains(&rating) {
            return Err(EngineError::InvalidRating(rating));
        }
        if !store.is_valid() {
            return Err(EngineError::InvalidId(store.0));
        }
        if !user.is_valid() {
            return Err(EngineError::InvalidId(user.0));
        }

        let review = Review {
            id: ReviewId(0),
            store,
            user,
            rating,
            comment: comment.into(),
            created_at: Timestamp::now(),
        };
        let (review, _) = self.db.reviews().insert(review)?;
        self.watches.table_changed(TableKind::Reviews);
        debug!(review = %review.id, store = %review.store, rating, "review submitted");
        Ok(review)
    }

    /// A store's reviews in submission order.
    pub fn reviews_for_store(&self, store: StoreId) -> Result<Vec<Review>> {
        if !store.is_valid() {
            return Err(EngineError::InvalidId(store.0));
        }
        Ok(self.db.reviews().scan(|r| r.store == store))
    }
}
