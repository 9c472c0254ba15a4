//! Watch types for keyed live queries.

use crate::db::TableKind;
use crate::error::EngineError;
use crate::types::{Booking, Sequence, Slot, Store, StoreId, UserId};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What a watcher is watching. One key maps to one query over one table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WatchKey {
    /// A user's display name.
    UserName { user: UserId },

    /// A user's email address.
    UserEmail { user: UserId },

    /// A store's display name.
    StoreName { store: StoreId },

    /// A store's location string.
    StoreLocation { store: StoreId },

    /// The full store catalog.
    StoreList,

    /// All slot rows belonging to one store.
    SlotsForStore { store: StoreId },

    /// All bookings made by one user, in insertion order.
    BookingsForUser { user: UserId },
}

impl WatchKey {
    pub fn user_name(user: UserId) -> Self {
        WatchKey::UserName { user }
    }

    pub fn user_email(user: UserId) -> Self {
        WatchKey::UserEmail { user }
    }

    pub fn store_name(store: StoreId) -> Self {
        WatchKey::StoreName { store }
    }

    pub fn store_location(store: StoreId) -> Self {
        WatchKey::StoreLocation { store }
    }

    pub fn store_list() -> Self {
        WatchKey::StoreList
    }

    pub fn slots_for_store(store: StoreId) -> Self {
        WatchKey::SlotsForStore { store }
    }

    pub fn bookings_for_user(user: UserId) -> Self {
        WatchKey::BookingsForUser { user }
    }

    /// The table whose commits can change this key's value.
    pub fn table(&self) -> TableKind {
        match self {
            WatchKey::UserName { .. } | WatchKey::UserEmail { .. } => TableKind::Users,
            WatchKey::StoreName { .. } | WatchKey::StoreLocation { .. } | WatchKey::StoreList => {
                TableKind::Stores
            }
            WatchKey::SlotsForStore { .. } => TableKind::Slots,
            WatchKey::BookingsForUser { .. } => TableKind::Bookings,
        }
    }

    /// Reject keys built from structurally invalid ids.
    pub fn validate(&self) -> Result<(), EngineError> {
        let id = match self {
            WatchKey::UserName { user }
            | WatchKey::UserEmail { user }
            | WatchKey::BookingsForUser { user } => user.0,
            WatchKey::StoreName { store }
            | WatchKey::StoreLocation { store }
            | WatchKey::SlotsForStore { store } => store.0,
            WatchKey::StoreList => return Ok(()),
        };
        if id <= 0 {
            return Err(EngineError::InvalidId(id));
        }
        Ok(())
    }
}

/// The evaluated result of a key's query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WatchValue {
    /// Single-field lookups. `None` means the row does not exist.
    Text { value: Option<String> },

    Stores { stores: Vec<Store> },

    Slots { slots: Vec<Slot> },

    Bookings { bookings: Vec<Booking> },
}

impl WatchValue {
    pub fn text(&self) -> Option<&str> {
        match self {
            WatchValue::Text { value } => value.as_deref(),
            _ => None,
        }
    }

    pub fn stores(&self) -> Option<&[Store]> {
        match self {
            WatchValue::Stores { stores } => Some(stores),
            _ => None,
        }
    }

    pub fn slots(&self) -> Option<&[Slot]> {
        match self {
            WatchValue::Slots { slots } => Some(slots),
            _ => None,
        }
    }

    pub fn bookings(&self) -> Option<&[Booking]> {
        match self {
            WatchValue::Bookings { bookings } => Some(bookings),
            _ => None,
        }
    }
}

/// One delivery to a watcher: the key, its new value, and the commit
/// sequence the value was observed at. Sequences delivered to any one
/// watcher are strictly increasing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WatchUpdate {
    pub key: WatchKey,
    pub value: WatchValue,
    pub sequence: Sequence,
}

/// Configuration for a watcher.
#[derive(Clone, Debug)]
pub struct WatchConfig {
    /// Max buffered updates. When the buffer is full the oldest queued
    /// update is displaced, so a slow consumer always finds the latest
    /// value. Default: 1
    pub buffer_size: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { buffer_size: 1 }
    }
}

/// Unique identifier for a watcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// Handle to manage a watch.
///
/// Dropping the handle detaches the watcher; the manager prunes it on the
/// next delivery attempt. Call `WatchManager::unsubscribe` to detach
/// immediately.
#[derive(Debug)]
pub struct WatchHandle {
    pub id: WatchId,
    pub key: WatchKey,
    /// Channel to receive updates.
    pub receiver: crossbeam_channel::Receiver<WatchUpdate>,
    pub(crate) alive: Arc<AtomicBool>,
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Relaxed);
    }
}

impl WatchHandle {
    /// Receive the next update (blocking).
    pub fn recv(&self) -> Result<WatchUpdate, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an update (non-blocking).
    pub fn try_recv(&self) -> Result<WatchUpdate, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<WatchUpdate, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}
