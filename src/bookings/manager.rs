//! Booking lifecycle: create, delete, list, reset.

use crate::db::{Database, TableKind};
use crate::error::{EngineError, Result};
use crate::slots::{AdjustOutcome, SlotEngine};
use crate::types::{Booking, BookingId, BookingRequest, UserId};
use crate::watch::{WatchConfig, WatchHandle, WatchKey, WatchManager};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Capacity units one booking consumes, regardless of party size.
pub const BOOKING_CAPACITY_COST: u32 = 2;

/// Creates and removes bookings, moving slot capacity in step.
#[derive(Clone)]
pub struct BookingManager {
    db: Arc<Database>,
    watches: Arc<WatchManager>,
    slots: SlotEngine,
}

impl BookingManager {
    pub(crate) fn new(db: Arc<Database>, watches: Arc<WatchManager>, slots: SlotEngine) -> Self {
        Self { db, watches, slots }
    }

    // --- Lifecycle ---

    /// Create a booking and consume [`BOOKING_CAPACITY_COST`] units from
    /// the matching `(store, hour)` slot.
    ///
    /// The referenced user and store must be structurally valid ids;
    /// their existence is not checked. A booking whose target slot does
    /// not exist still succeeds: the phantom reduction is logged and
    /// availability stays untouched.
    pub fn create_booking(&self, request: BookingRequest) -> Result<Booking> {
        if request.persons == 0 {
            return Err(EngineError::InvalidPartySize(request.persons));
        }
        if !request.user.is_valid() {
            return Err(EngineError::InvalidId(request.user.0));
        }
        if !request.store.is_valid() {
            return Err(EngineError::InvalidId(request.store.0));
        }

        let booking = Booking {
            id: BookingId(0),
            user: request.user,
            store: request.store,
            date: request.date,
            persons: request.persons,
            hour: request.hour,
        };
        let (booking, _) = self.db.bookings().insert(booking)?;
        self.watches.table_changed(TableKind::Bookings);
        debug!(booking = %booking.id, user = %booking.user, store = %booking.store, "booking created");

        // The booking row is already committed when the counter moves. A
        // failed or phantom reduction leaves availability stale; log it
        // and keep the booking.
        match self
            .slots
            .reduce_availability(booking.store, &booking.hour, BOOKING_CAPACITY_COST)
        {
            Ok(AdjustOutcome::Applied { .. }) => {}
            Ok(AdjustOutcome::NoMatch) => {
                warn!(
                    booking = %booking.id,
                    store = %booking.store,
                    hour = %booking.hour,
                    "booking has no backing slot"
                );
            }
            Err(e) => {
                error!(
                    booking = %booking.id,
                    error = %e,
                    "availability reduction failed after booking commit"
                );
            }
        }

        Ok(booking)
    }

    /// Delete a booking and hand its capacity back to the first slot
    /// matching the booking's `(store, hour)`.
    ///
    /// Deletes are idempotent: a missing row (or a structurally invalid
    /// id) is `Ok(None)` and restores nothing.
    pub fn delete_booking(&self, id: BookingId) -> Result<Option<Booking>> {
        let removed = match self.db.bookings().delete(id.0) {
            Some((booking, _)) => booking,
            None => return Ok(None),
        };
        self.watches.table_changed(TableKind::Bookings);
        debug!(booking = %removed.id, user = %removed.user, "booking deleted");

        let backing = self
            .db
            .slots()
            .scan(|s| s.store == removed.store && s.hour == removed.hour)
            .into_iter()
            .next();
        match backing {
            Some(slot) => {
                if let Err(e) = self
                    .slots
                    .increase_availability(slot.id, BOOKING_CAPACITY_COST)
                {
                    error!(booking = %removed.id, error = %e, "capacity restore failed after delete");
                }
            }
            None => {
                warn!(
                    booking = %removed.id,
                    store = %removed.store,
                    hour = %removed.hour,
                    "no slot to restore capacity to"
                );
            }
        }

        Ok(Some(removed))
    }

    /// Remove every booking. Reset primitive: slot availability is left
    /// as-is, unlike single deletes.
    pub fn delete_all_bookings(&self) -> usize {
        let (count, committed) = self.db.bookings().clear();
        if committed.is_some() {
            self.watches.table_changed(TableKind::Bookings);
            info!(count, "all bookings deleted");
        }
        count
    }

    // --- Queries ---

    /// A user's bookings in insertion order.
    pub fn bookings_for_user(&self, user: UserId) -> Result<Vec<Booking>> {
        if !user.is_valid() {
            return Err(EngineError::InvalidId(user.0));
        }
        Ok(self.db.bookings().scan(|b| b.user == user))
    }

    /// Live query over a user's bookings.
    pub fn watch_user(&self, user: UserId) -> Result<WatchHandle> {
        self.watches
            .subscribe(WatchKey::bookings_for_user(user), WatchConfig::default())
    }

    /// Every booking in the system, in insertion order.
    pub fn all_bookings(&self) -> Vec<Booking> {
        self.db.bookings().all()
    }
}
