//! Store catalog.
//!
//! Stores are seeded together with their slot rows. Names are not unique;
//! same-named rows merge into one venue on the read side.

mod manager;

pub use manager::StoreCatalog;
