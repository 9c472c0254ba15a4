//! In-memory storage substrate.
//!
//! Five typed tables share one commit counter; every mutation is stamped
//! with the next sequence so live queries can order and deduplicate what
//! they observe.

mod database;
mod table;

pub use database::{Database, DatabaseSnapshot};
pub use table::{Row, Table, TableKind};
