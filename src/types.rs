//! Core types for the reservation engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Unique identifier for a registered user.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl UserId {
    /// Ids are positive; zero and negatives are structurally invalid.
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoreId(pub i64);

impl StoreId {
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Debug for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreId({})", self.0)
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a time slot row.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(pub i64);

impl SlotId {
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Debug for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotId({})", self.0)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a booking.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookingId(pub i64);

impl BookingId {
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Debug for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BookingId({})", self.0)
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a review.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReviewId(pub i64);

impl ReviewId {
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Debug for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReviewId({})", self.0)
    }
}

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position in the commit stream (process-wide, shared by all tables).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Sequence(pub u64);

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seq({})", self.0)
    }
}

impl Sequence {
    pub fn next(self) -> Self {
        Sequence(self.0 + 1)
    }
}

/// Microseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before Unix epoch");
        Timestamp(duration.as_micros() as i64)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// A registered user account.
///
/// Credentials are stored and compared exactly as supplied; hashing is the
/// responsibility of whatever layer feeds this engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password: String,
    pub phone_number: String,
    pub email: String,
}

/// One hour label a store offers, with the capacity it was seeded with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourCapacity {
    pub hour: String,
    pub capacity: u32,
}

impl HourCapacity {
    pub fn new(hour: impl Into<String>, capacity: u32) -> Self {
        Self {
            hour: hour.into(),
            capacity,
        }
    }
}

/// A bookable store.
///
/// Names are not unique; several rows may share one name and present as a
/// single venue with the union of their hours. Grouping is a read-side
/// concern (see `StoreCatalog::hours_for_name`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub info: String,
    pub location: String,

    /// Ordered hour labels with their seeded capacity. The live counters
    /// are the `Slot` rows; this list is catalog description only.
    pub hours: Vec<HourCapacity>,
}

/// Remaining capacity for one `(store, hour)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// Unique identifier (assigned by storage).
    pub id: SlotId,

    /// Owning store.
    pub store: StoreId,

    /// Opaque hour label, e.g. `"18:00"`.
    pub hour: String,

    /// Remaining capacity units. Unsigned: mutations clamp at zero.
    pub availability: u32,
}

/// A confirmed reservation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique identifier (assigned by storage).
    pub id: BookingId,

    /// Who booked. Reference by value; existence is not enforced.
    pub user: UserId,

    /// Where. Reference by value; existence is not enforced.
    pub store: StoreId,

    /// Calendar date as supplied by the caller, e.g. `"2024-05-01"`.
    pub date: String,

    /// Party size. Always at least 1.
    pub persons: u32,

    /// Hour label matching the slot the booking consumed capacity from.
    pub hour: String,
}

/// A user review of a store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub store: StoreId,
    pub user: UserId,
    pub rating: u8,
    pub comment: String,
    pub created_at: Timestamp,
}

/// Input for creating a booking (before the id is assigned).
#[derive(Clone, Debug)]
pub struct BookingRequest {
    pub user: UserId,
    pub store: StoreId,
    pub date: String,
    pub persons: u32,
    pub hour: String,
}

impl BookingRequest {
    pub fn new(
        user: UserId,
        store: StoreId,
        date: impl Into<String>,
        persons: u32,
        hour: impl Into<String>,
    ) -> Self {
        Self {
            user,
            store,
            date: date.into(),
            persons,
            hour: hour.into(),
        }
    }
}

/// Profile fields for registration (before the id is drawn).
#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub phone_number: String,
    pub email: String,
}

impl NewUser {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            phone_number: String::new(),
            email: String::new(),
        }
    }

    /// Add a phone number.
    pub fn with_phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = phone_number.into();
        self
    }

    /// Add an email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }
}

/// Input for seeding a store together with its slot rows.
#[derive(Clone, Debug)]
pub struct StoreSeed {
    pub name: String,
    pub info: String,
    pub location: String,
    pub hours: Vec<HourCapacity>,
}

impl StoreSeed {
    pub fn new(
        name: impl Into<String>,
        info: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            info: info.into(),
            location: location.into(),
            hours: Vec::new(),
        }
    }

    /// Add one bookable hour with its starting capacity.
    pub fn with_hour(mut self, hour: impl Into<String>, capacity: u32) -> Self {
        self.hours.push(HourCapacity::new(hour, capacity));
        self
    }

    /// Replace the full hour list.
    pub fn with_hours(mut self, hours: Vec<HourCapacity>) -> Self {
        self.hours = hours;
        self
    }
}

/// An authenticated session. Plain value, no global state: whoever holds
/// it acts as that user until they drop it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    user: UserId,
    started: Timestamp,
}

impl Session {
    pub(crate) fn start(user: UserId) -> Self {
        Self {
            user,
            started: Timestamp::now(),
        }
    }

    /// The user this session acts as.
    pub fn user(&self) -> UserId {
        self.user
    }

    /// When the session was established.
    pub fn started(&self) -> Timestamp {
        self.started
    }
}

/// Engine statistics.
#[derive(Clone, Debug, Default)]
pub struct EngineStats {
    pub user_count: u64,
    pub store_count: u64,
    pub slot_count: u64,
    pub booking_count: u64,
    pub review_count: u64,
    pub last_committed: Sequence,
}
