//! Booking lifecycle manager.
//!
//! Bookings reference users and stores by value and consume a fixed
//! amount of slot capacity on creation. Single deletes hand the capacity
//! back; the bulk reset does not.

mod manager;

pub use manager::{BookingManager, BOOKING_CAPACITY_COST};
