//! Keyed live queries over the dataset.
//!
//! A watch key names one query (a user's bookings, a store's slots, a
//! single profile field, the whole catalog). Watchers subscribing to the
//! same key share one underlying evaluation per commit:
//! - The current value is delivered immediately on subscribe
//! - Results equal to the last observed value are suppressed
//! - Last values are cached per key and can be peeked without subscribing
//! - Per-watcher buffers displace the oldest update when full, so slow
//!   consumers always converge on the latest state
//!
//! # Example
//!
//! ```ignore
//! let manager = WatchManager::new(db);
//!
//! // Watch the slots of store 1
//! let handle = manager.subscribe(
//!     WatchKey::slots_for_store(StoreId(1)),
//!     WatchConfig::default(),
//! )?;
//!
//! // First delivery is the current value, then one update per change
//! loop {
//!     match handle.recv() {
//!         Ok(update) => println!("slots now: {:?}", update.value.slots()),
//!         Err(_) => break,
//!     }
//! }
//! ```

mod manager;
mod types;

pub use manager::WatchManager;
pub use types::{WatchConfig, WatchHandle, WatchId, WatchKey, WatchUpdate, WatchValue};
