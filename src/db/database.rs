//! The typed tables behind one handle, plus snapshot exchange.

use crate::db::table::{Row, Table, TableKind};
use crate::error::{EngineError, Result};
use crate::types::{Booking, Review, Sequence, Slot, Store, User};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

impl Row for User {
    const KIND: TableKind = TableKind::Users;

    fn key(&self) -> i64 {
        self.id.0
    }

    fn set_key(&mut self, id: i64) {
        self.id.0 = id;
    }
}

impl Row for Store {
    const KIND: TableKind = TableKind::Stores;

    fn key(&self) -> i64 {
        self.id.0
    }

    fn set_key(&mut self, id: i64) {
        self.id.0 = id;
    }
}

impl Row for Slot {
    const KIND: TableKind = TableKind::Slots;

    fn key(&self) -> i64 {
        self.id.0
    }

    fn set_key(&mut self, id: i64) {
        self.id.0 = id;
    }
}

impl Row for Booking {
    const KIND: TableKind = TableKind::Bookings;

    fn key(&self) -> i64 {
        self.id.0
    }

    fn set_key(&mut self, id: i64) {
        self.id.0 = id;
    }
}

impl Row for Review {
    const KIND: TableKind = TableKind::Reviews;

    fn key(&self) -> i64 {
        self.id.0
    }

    fn set_key(&mut self, id: i64) {
        self.id.0 = id;
    }
}

/// Whole-dataset export. The seam to whatever external store owns
/// durability and transactions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    pub users: Vec<User>,
    pub stores: Vec<Store>,
    pub slots: Vec<Slot>,
    pub bookings: Vec<Booking>,
    pub reviews: Vec<Review>,
}

/// The in-memory relational dataset: five typed tables sharing one commit
/// counter.
pub struct Database {
    users: Table<User>,
    stores: Table<Store>,
    slots: Table<Slot>,
    bookings: Table<Booking>,
    reviews: Table<Review>,
    commits: Arc<AtomicU64>,
}

impl Database {
    pub fn new() -> Self {
        let commits = Arc::new(AtomicU64::new(0));
        Self {
            users: Table::new(commits.clone()),
            stores: Table::new(commits.clone()),
            slots: Table::new(commits.clone()),
            bookings: Table::new(commits.clone()),
            reviews: Table::new(commits.clone()),
            commits,
        }
    }

    pub fn users(&self) -> &Table<User> {
        &self.users
    }

    pub fn stores(&self) -> &Table<Store> {
        &self.stores
    }

    pub fn slots(&self) -> &Table<Slot> {
        &self.slots
    }

    pub fn bookings(&self) -> &Table<Booking> {
        &self.bookings
    }

    pub fn reviews(&self) -> &Table<Review> {
        &self.reviews
    }

    /// Sequence of the most recent commit in any table.
    pub fn last_committed(&self) -> Sequence {
        Sequence(self.commits.load(Ordering::SeqCst))
    }

    /// Export every table. Each table is captured consistently under its
    /// own lock; concurrent writers may interleave between tables, so take
    /// snapshots at quiescent points.
    pub fn dump(&self) -> DatabaseSnapshot {
        DatabaseSnapshot {
            users: self.users.all(),
            stores: self.stores.all(),
            slots: self.slots.all(),
            bookings: self.bookings.all(),
            reviews: self.reviews.all(),
        }
    }

    /// Replace every table's contents from a snapshot. Rows must carry
    /// positive ids; each table records one commit.
    pub fn restore(&self, snapshot: DatabaseSnapshot) -> Result<()> {
        check_keys(TableKind::Users, &snapshot.users)?;
        check_keys(TableKind::Stores, &snapshot.stores)?;
        check_keys(TableKind::Slots, &snapshot.slots)?;
        check_keys(TableKind::Bookings, &snapshot.bookings)?;
        check_keys(TableKind::Reviews, &snapshot.reviews)?;

        self.users.replace_all(snapshot.users);
        self.stores.replace_all(snapshot.stores);
        self.slots.replace_all(snapshot.slots);
        self.bookings.replace_all(snapshot.bookings);
        self.reviews.replace_all(snapshot.reviews);
        Ok(())
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

fn check_keys<R: Row>(kind: TableKind, rows: &[R]) -> Result<()> {
    for row in rows {
        if row.key() <= 0 {
            return Err(EngineError::Storage(format!(
                "snapshot row in table {} has non-positive id {}",
                kind.name(),
                row.key()
            )));
        }
    }
    Ok(())
}
