//! Generic typed table guarded by a single lock.

use crate::error::{EngineError, Result};
use crate::types::Sequence;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Which table a commit touched. Used to route change notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TableKind {
    Users,
    Stores,
    Slots,
    Bookings,
    Reviews,
}

impl TableKind {
    pub fn name(self) -> &'static str {
        match self {
            TableKind::Users => "users",
            TableKind::Stores => "stores",
            TableKind::Slots => "slots",
            TableKind::Bookings => "bookings",
            TableKind::Reviews => "reviews",
        }
    }
}

/// A row that can live in a [`Table`].
pub trait Row: Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: TableKind;

    /// Primary key. Zero means "not yet assigned".
    fn key(&self) -> i64;

    /// Stamp the primary key during auto-assignment.
    fn set_key(&mut self, id: i64);
}

struct TableInner<R> {
    rows: BTreeMap<i64, R>,
    next_id: i64,
    last_commit: Sequence,
}

/// One typed table: rows keyed by positive id, mutations stamped with the
/// process-wide commit sequence.
///
/// The commit counter is shared by every table in the database. It is
/// advanced while holding this table's write lock, so the sequences one
/// table hands out are strictly increasing and a `(rows, sequence)` pair
/// captured under the read lock is internally consistent.
pub struct Table<R: Row> {
    inner: RwLock<TableInner<R>>,
    commits: Arc<AtomicU64>,
}

impl<R: Row> Table<R> {
    pub(crate) fn new(commits: Arc<AtomicU64>) -> Self {
        Self {
            inner: RwLock::new(TableInner {
                rows: BTreeMap::new(),
                next_id: 1,
                last_commit: Sequence::default(),
            }),
            commits,
        }
    }

    pub fn kind(&self) -> TableKind {
        R::KIND
    }

    pub fn name(&self) -> &'static str {
        R::KIND.name()
    }

    fn commit(&self, inner: &mut TableInner<R>) -> Sequence {
        let seq = Sequence(self.commits.fetch_add(1, Ordering::SeqCst) + 1);
        inner.last_commit = seq;
        seq
    }

    // --- Writes ---

    /// Insert a row. A key of zero auto-assigns the next sequential id; an
    /// explicit key that is already occupied is a conflict.
    pub fn insert(&self, mut row: R) -> Result<(R, Sequence)> {
        if row.key() < 0 {
            return Err(EngineError::InvalidId(row.key()));
        }
        let mut inner = self.inner.write();
        let id = if row.key() == 0 {
            let id = inner.next_id;
            inner.next_id += 1;
            row.set_key(id);
            id
        } else {
            let id = row.key();
            if inner.rows.contains_key(&id) {
                return Err(EngineError::Conflict {
                    table: R::KIND.name(),
                    id,
                });
            }
            if id >= inner.next_id {
                inner.next_id = id + 1;
            }
            id
        };
        inner.rows.insert(id, row.clone());
        let seq = self.commit(&mut inner);
        Ok((row, seq))
    }

    /// Mutate every row matching `pred` in place, under one write lock.
    ///
    /// Returns the matched rows in their post-update state. A commit is
    /// recorded only if at least one row actually changed, so watchers are
    /// not poked for no-op updates.
    pub fn update_where<P, A>(&self, pred: P, mut apply: A) -> (Vec<R>, Option<Sequence>)
    where
        P: Fn(&R) -> bool,
        A: FnMut(&mut R),
    {
        let mut inner = self.inner.write();
        let mut matched = Vec::new();
        let mut changed = false;
        for row in inner.rows.values_mut() {
            if pred(row) {
                let before = row.clone();
                apply(row);
                if *row != before {
                    changed = true;
                }
                matched.push(row.clone());
            }
        }
        if !changed {
            return (matched, None);
        }
        let seq = self.commit(&mut inner);
        (matched, Some(seq))
    }

    /// Remove a row by key. Missing rows are a silent no-op.
    pub fn delete(&self, id: i64) -> Option<(R, Sequence)> {
        let mut inner = self.inner.write();
        let removed = inner.rows.remove(&id)?;
        let seq = self.commit(&mut inner);
        Some((removed, seq))
    }

    /// Remove every row. Returns how many were removed; empty tables do
    /// not commit.
    pub fn clear(&self) -> (usize, Option<Sequence>) {
        let mut inner = self.inner.write();
        let count = inner.rows.len();
        if count == 0 {
            return (0, None);
        }
        inner.rows.clear();
        let seq = self.commit(&mut inner);
        (count, Some(seq))
    }

    /// Replace the whole table from a snapshot. The id allocator resumes
    /// past the highest restored key.
    pub(crate) fn replace_all(&self, rows: Vec<R>) -> Sequence {
        let mut inner = self.inner.write();
        inner.rows.clear();
        let mut next_id = 1;
        for row in rows {
            let id = row.key();
            if id >= next_id {
                next_id = id + 1;
            }
            inner.rows.insert(id, row);
        }
        inner.next_id = next_id;
        self.commit(&mut inner)
    }

    // --- Reads ---

    pub fn get(&self, id: i64) -> Option<R> {
        self.inner.read().rows.get(&id).cloned()
    }

    /// Point read plus the table's commit sequence, captured under one
    /// lock.
    pub fn value(&self, id: i64) -> (Option<R>, Sequence) {
        let inner = self.inner.read();
        (inner.rows.get(&id).cloned(), inner.last_commit)
    }

    /// All rows in key order.
    pub fn all(&self) -> Vec<R> {
        self.inner.read().rows.values().cloned().collect()
    }

    /// Rows matching `pred`, in key order.
    pub fn scan<P>(&self, pred: P) -> Vec<R>
    where
        P: Fn(&R) -> bool,
    {
        self.inner
            .read()
            .rows
            .values()
            .filter(|r| pred(r))
            .cloned()
            .collect()
    }

    /// Predicate scan plus the commit sequence, captured under one lock.
    pub fn snapshot<P>(&self, pred: P) -> (Vec<R>, Sequence)
    where
        P: Fn(&R) -> bool,
    {
        let inner = self.inner.read();
        let rows = inner.rows.values().filter(|r| pred(r)).cloned().collect();
        (rows, inner.last_commit)
    }

    pub fn len(&self) -> usize {
        self.inner.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().rows.is_empty()
    }

    /// Sequence of the last mutation this table committed.
    pub fn last_commit(&self) -> Sequence {
        self.inner.read().last_commit
    }
}
