//! # Maitre
//!
//! An embeddable, thread-safe reservation engine: stores, time slots,
//! bookings, and reviews, with keyed live queries over all of them.
//!
//! ## Core Concepts
//!
//! - **Slots**: Per-store, per-hour capacity counters with atomic,
//!   clamp-at-zero mutations
//! - **Bookings**: Reservations that consume slot capacity on creation
//!   and hand it back on deletion
//! - **Watches**: Keyed live queries with per-key deduplication, a
//!   last-value cache, and latest-value-wins delivery
//! - **Sessions**: Plain values from login/registration; no global state
//!
//! ## Example
//!
//! ```ignore
//! use maitre::{BookingRequest, Engine, NewUser, StoreId, StoreSeed, WatchKey};
//!
//! let engine = Engine::new();
//!
//! // Seed a store with two bookable hours
//! let store = engine.add_store(
//!     StoreSeed::new("Trattoria", "Pasta and wine", "Via Roma 1")
//!         .with_hour("18:00", 4)
//!         .with_hour("19:00", 6),
//! )?;
//!
//! // Register and book
//! let session = engine.register(NewUser::new("alice", "secret"))?;
//! let handle = engine.watch(WatchKey::slots_for_store(store.id))?;
//! engine.create_booking(BookingRequest::new(
//!     session.user(), store.id, "2024-05-01", 3, "18:00",
//! ))?;
//!
//! // The watcher sees availability drop from 4 to 2
//! let update = handle.recv()?;
//! ```

pub mod bookings;
pub mod catalog;
pub mod db;
pub mod engine;
pub mod error;
pub mod session;
pub mod slots;
pub mod types;
pub mod watch;

// Re-exports
pub use bookings::{BookingManager, BOOKING_CAPACITY_COST};
pub use catalog::StoreCatalog;
pub use db::{Database, DatabaseSnapshot, Row, Table, TableKind};
pub use engine::Engine;
pub use error::{EngineError, ErrorKind, Result};
pub use session::Identity;
pub use slots::{AdjustOutcome, SlotEngine};
pub use types::*;
pub use watch::{
    WatchConfig, WatchHandle, WatchId, WatchKey, WatchManager, WatchUpdate, WatchValue,
};
