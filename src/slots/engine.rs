//! Atomic availability mutations over time slots.

use crate::db::{Database, TableKind};
use crate::error::{EngineError, Result};
use crate::types::{Slot, SlotId, StoreId};
use crate::watch::{WatchConfig, WatchHandle, WatchKey, WatchManager};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of an availability adjustment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdjustOutcome {
    /// At least one slot row matched; these are the rows after the update.
    Applied { slots: Vec<Slot> },

    /// No slot row matched. The adjustment was a no-op.
    NoMatch,
}

impl AdjustOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, AdjustOutcome::Applied { .. })
    }
}

/// Applies atomic capacity changes to `(store, hour)` slots.
///
/// Every mutation is one conditional update under the slot table's write
/// lock: concurrent adjustments interleave as if serialized and no update
/// is lost. Availability is unsigned and clamps at zero.
#[derive(Clone)]
pub struct SlotEngine {
    db: Arc<Database>,
    watches: Arc<WatchManager>,
}

impl SlotEngine {
    pub(crate) fn new(db: Arc<Database>, watches: Arc<WatchManager>) -> Self {
        Self { db, watches }
    }

    // --- Reads ---

    /// All slot rows for a store, in key order.
    ///
    /// Structurally invalid ids are an error; a valid id with no rows is
    /// an empty list.
    pub fn slots_for_store(&self, store: StoreId) -> Result<Vec<Slot>> {
        if !store.is_valid() {
            return Err(EngineError::InvalidId(store.0));
        }
        Ok(self.db.slots().scan(|s| s.store == store))
    }

    /// Point read of one slot row.
    pub fn slot(&self, id: SlotId) -> Result<Option<Slot>> {
        if !id.is_valid() {
            return Err(EngineError::InvalidId(id.0));
        }
        Ok(self.db.slots().get(id.0))
    }

    /// Live query over a store's slots.
    pub fn watch_store(&self, store: StoreId) -> Result<WatchHandle> {
        self.watches
            .subscribe(WatchKey::slots_for_store(store), WatchConfig::default())
    }

    // --- Mutations ---

    /// Subtract `amount` from every slot matching `(store, hour)`,
    /// clamping at zero.
    ///
    /// A target that matches nothing (including an invalid store id) is
    /// not an error: the call succeeds with [`AdjustOutcome::NoMatch`] and
    /// a warning is logged.
    pub fn reduce_availability(
        &self,
        store: StoreId,
        hour: &str,
        amount: u32,
    ) -> Result<AdjustOutcome> {
        let (matched, committed) = self.db.slots().update_where(
            |s| s.store == store && s.hour == hour,
            |s| s.availability = s.availability.saturating_sub(amount),
        );
        if matched.is_empty() {
            warn!(%store, hour, amount, "availability reduction matched no slot");
            return Ok(AdjustOutcome::NoMatch);
        }
        if committed.is_some() {
            self.watches.table_changed(TableKind::Slots);
        }
        debug!(%store, hour, amount, rows = matched.len(), "availability reduced");
        Ok(AdjustOutcome::Applied { slots: matched })
    }

    /// Add `amount` to one slot, saturating at `u32::MAX`.
    ///
    /// Missing slots behave like [`SlotEngine::reduce_availability`]
    /// targets that match nothing.
    pub fn increase_availability(&self, slot: SlotId, amount: u32) -> Result<AdjustOutcome> {
        let (matched, committed) = self.db.slots().update_where(
            |s| s.id == slot,
            |s| s.availability = s.availability.saturating_add(amount),
        );
        if matched.is_empty() {
            warn!(%slot, amount, "availability increase matched no slot");
            return Ok(AdjustOutcome::NoMatch);
        }
        if committed.is_some() {
            self.watches.table_changed(TableKind::Slots);
        }
        debug!(%slot, amount, "availability increased");
        Ok(AdjustOutcome::Applied { slots: matched })
    }
}
