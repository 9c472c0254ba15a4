//! Slot availability engine.
//!
//! Slots are per-store, per-hour capacity counters. Reductions and
//! increases are atomic conditional updates with clamp-at-zero semantics.

mod engine;

pub use engine::{AdjustOutcome, SlotEngine};
