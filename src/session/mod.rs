//! Identity and sessions.
//!
//! Sessions are plain values handed out by `login`/`register`; there is
//! no ambient logged-in state anywhere in the engine.

mod identity;

pub use identity::Identity;
