//! Integration tests for the reservation engine.

use maitre::{
    AdjustOutcome, BookingRequest, Engine, NewUser, StoreId, StoreSeed, UserId, WatchKey,
    BOOKING_CAPACITY_COST,
};
use std::time::Duration;

fn test_engine() -> Engine {
    Engine::new()
}

/// Engine with one store ("Trattoria", id 1) offering 18:00 x4 and 19:00 x6.
fn seeded_engine() -> Engine {
    let engine = test_engine();
    engine
        .add_store(
            StoreSeed::new("Trattoria", "Pasta and wine", "Via Roma 1")
                .with_hour("18:00", 4)
                .with_hour("19:00", 6),
        )
        .unwrap();
    engine
}

// --- Realistic Workflow Tests ---

#[test]
fn test_dinner_reservation_workflow() {
    let engine = seeded_engine();

    // New diner signs up and logs back in
    let session = engine
        .register(
            NewUser::new("alice", "secret")
                .with_email("alice@example.com")
                .with_phone_number("555-0100"),
        )
        .unwrap();
    let login = engine.login("alice", "secret").unwrap();
    assert_eq!(login.user(), session.user());

    // Browse the catalog
    let stores = engine.stores();
    assert_eq!(stores.len(), 1);
    let store = &stores[0];
    assert_eq!(store.name, "Trattoria");

    // Check what is bookable tonight
    let slots = engine.slots_for_store(store.id).unwrap();
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].availability, 4);

    // Book a table for three at six
    let booking = engine
        .create_booking(BookingRequest::new(
            session.user(),
            store.id,
            "2024-05-01",
            3,
            "18:00",
        ))
        .unwrap();

    // The booking shows up in the diner's history
    let history = engine.bookings_for_user(session.user()).unwrap();
    assert_eq!(history, vec![booking.clone()]);

    // Capacity moved by the fixed cost, not the party size
    let slots = engine.slots_for_store(store.id).unwrap();
    assert_eq!(slots[0].availability, 4 - BOOKING_CAPACITY_COST);
    assert_eq!(slots[1].availability, 6);

    // Plans change: cancel, capacity comes back
    engine.delete_booking(booking.id).unwrap();
    assert!(engine.bookings_for_user(session.user()).unwrap().is_empty());
    let slots = engine.slots_for_store(store.id).unwrap();
    assert_eq!(slots[0].availability, 4);

    // Leave a review anyway
    let review = engine
        .submit_review(store.id, session.user(), 4, "Great pasta, slow service")
        .unwrap();
    let reviews = engine.reviews_for_store(store.id).unwrap();
    assert_eq!(reviews, vec![review]);
}

#[test]
fn test_live_screen_workflow() {
    // A slot list screen and a booking history screen stay current while
    // another path mutates the data.
    let engine = seeded_engine();
    let session = engine.register(NewUser::new("bob", "pw")).unwrap();

    let slot_screen = engine.watch(WatchKey::slots_for_store(StoreId(1))).unwrap();
    let history_screen = engine
        .watch(WatchKey::bookings_for_user(session.user()))
        .unwrap();

    // Both screens render the current state immediately
    let first = slot_screen.recv_timeout(Duration::from_millis(200)).unwrap();
    assert_eq!(first.value.slots().unwrap()[0].availability, 4);
    let first = history_screen
        .recv_timeout(Duration::from_millis(200))
        .unwrap();
    assert!(first.value.bookings().unwrap().is_empty());

    let booking = engine
        .create_booking(BookingRequest::new(
            session.user(),
            StoreId(1),
            "2024-05-01",
            2,
            "18:00",
        ))
        .unwrap();

    // Both screens observe the booking
    let update = history_screen
        .recv_timeout(Duration::from_millis(200))
        .unwrap();
    assert_eq!(update.value.bookings().unwrap(), &[booking.clone()]);
    let update = slot_screen.recv_timeout(Duration::from_millis(200)).unwrap();
    assert_eq!(update.value.slots().unwrap()[0].availability, 2);

    // And the cancellation
    engine.delete_booking(booking.id).unwrap();
    let update = history_screen
        .recv_timeout(Duration::from_millis(200))
        .unwrap();
    assert!(update.value.bookings().unwrap().is_empty());
    let update = slot_screen.recv_timeout(Duration::from_millis(200)).unwrap();
    assert_eq!(update.value.slots().unwrap()[0].availability, 4);
}

#[test]
fn test_multi_location_venue() {
    // Two rows share one name: the venue has two time configurations.
    let engine = test_engine();
    engine
        .add_store(
            StoreSeed::new("Trattoria", "Downtown", "Via Roma 1")
                .with_hour("18:00", 4)
                .with_hour("19:00", 4),
        )
        .unwrap();
    engine
        .add_store(
            StoreSeed::new("Trattoria", "Harbor", "Pier 9")
                .with_hour("19:00", 2)
                .with_hour("20:00", 2),
        )
        .unwrap();

    let rows = engine.catalog().stores_named("Trattoria");
    assert_eq!(rows.len(), 2);
    assert_ne!(rows[0].id, rows[1].id);

    // The merged hour list is what a grouped detail screen shows
    let hours = engine.catalog().hours_for_name("Trattoria");
    assert_eq!(hours, ["18:00", "19:00", "20:00"]);

    // Booking against one row leaves the other row's slots alone
    engine
        .create_booking(BookingRequest::new(
            UserId(7),
            rows[0].id,
            "2024-05-01",
            2,
            "19:00",
        ))
        .unwrap();
    let downtown = engine.slots_for_store(rows[0].id).unwrap();
    let harbor = engine.slots_for_store(rows[1].id).unwrap();
    assert_eq!(downtown[1].availability, 2);
    assert_eq!(harbor[0].availability, 2);
}

// --- Availability Scenarios ---

#[test]
fn test_reduce_clamps_at_zero() {
    let engine = test_engine();
    engine
        .add_store(StoreSeed::new("Bar", "", "").with_hour("18:00", 4))
        .unwrap();

    // Two reductions drain it, the third has nothing left to take
    for expected in [2u32, 0, 0] {
        let outcome = engine.reduce_availability(StoreId(1), "18:00", 2).unwrap();
        match outcome {
            AdjustOutcome::Applied { slots } => assert_eq!(slots[0].availability, expected),
            AdjustOutcome::NoMatch => panic!("slot exists"),
        }
    }
    let slots = engine.slots_for_store(StoreId(1)).unwrap();
    assert_eq!(slots[0].availability, 0);
}

#[test]
fn test_reduce_hits_every_matching_row() {
    // One store seeded with the same hour twice produces two slot rows for
    // that (store, hour) pair; a reduction applies to both.
    let engine = test_engine();
    engine
        .add_store(
            StoreSeed::new("Bar", "", "")
                .with_hour("18:00", 4)
                .with_hour("18:00", 2),
        )
        .unwrap();

    let outcome = engine.reduce_availability(StoreId(1), "18:00", 2).unwrap();
    let slots = match outcome {
        AdjustOutcome::Applied { slots } => slots,
        AdjustOutcome::NoMatch => panic!("slots exist"),
    };
    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].availability, 2);
    assert_eq!(slots[1].availability, 0);
}

#[test]
fn test_booking_without_backing_slot_succeeds() {
    // The hour does not exist as a slot row. The booking still lands and
    // no availability moves anywhere.
    let engine = seeded_engine();
    let booking = engine
        .create_booking(BookingRequest::new(
            UserId(7),
            StoreId(1),
            "2024-05-01",
            2,
            "23:00",
        ))
        .unwrap();

    assert_eq!(engine.bookings_for_user(UserId(7)).unwrap(), vec![booking]);
    let slots = engine.slots_for_store(StoreId(1)).unwrap();
    assert_eq!(slots[0].availability, 4);
    assert_eq!(slots[1].availability, 6);
}

#[test]
fn test_delete_restores_fixed_cost() {
    let engine = seeded_engine();
    let booking = engine
        .create_booking(BookingRequest::new(
            UserId(7),
            StoreId(1),
            "2024-05-01",
            3,
            "18:00",
        ))
        .unwrap();
    assert_eq!(
        engine.slots_for_store(StoreId(1)).unwrap()[0].availability,
        2
    );

    let removed = engine.delete_booking(booking.id).unwrap();
    assert_eq!(removed.unwrap().id, booking.id);
    assert_eq!(
        engine.slots_for_store(StoreId(1)).unwrap()[0].availability,
        4
    );

    // Deleting again is a no-op; nothing is restored twice
    assert!(engine.delete_booking(booking.id).unwrap().is_none());
    assert_eq!(
        engine.slots_for_store(StoreId(1)).unwrap()[0].availability,
        4
    );
}

#[test]
fn test_delete_all_bookings_is_reset_only() {
    let engine = seeded_engine();
    for user in [7, 8, 9] {
        engine
            .create_booking(BookingRequest::new(
                UserId(user),
                StoreId(1),
                "2024-05-01",
                2,
                "19:00",
            ))
            .unwrap();
    }
    assert_eq!(
        engine.slots_for_store(StoreId(1)).unwrap()[1].availability,
        0
    );

    assert_eq!(engine.delete_all_bookings(), 3);
    for user in [7, 8, 9] {
        assert!(engine.bookings_for_user(UserId(user)).unwrap().is_empty());
    }

    // The bulk reset leaves availability where it was
    assert_eq!(
        engine.slots_for_store(StoreId(1)).unwrap()[1].availability,
        0
    );
    assert_eq!(engine.delete_all_bookings(), 0);
}

// --- Identity Scenarios ---

#[test]
fn test_login_exact_match_only() {
    let engine = test_engine();
    let session = engine.register(NewUser::new("alice", "secret")).unwrap();

    assert_eq!(engine.login("alice", "secret").unwrap().user(), session.user());

    for (username, password) in [("alice", "Secret"), ("ALICE", "secret"), ("alice", "")] {
        assert!(engine.login(username, password).is_err());
    }
}

#[test]
fn test_register_many_users() {
    let engine = test_engine();
    let mut seen = Vec::new();
    for i in 0..50 {
        let session = engine
            .register(NewUser::new(format!("user{i}"), "pw"))
            .unwrap();
        assert!(session.user().is_valid());
        assert!(!seen.contains(&session.user()));
        seen.push(session.user());
    }
    assert_eq!(engine.stats().user_count, 50);
}

// --- Snapshot Exchange ---

#[test]
fn test_snapshot_roundtrip_preserves_everything() {
    let engine = seeded_engine();
    let session = engine.register(NewUser::new("alice", "secret")).unwrap();
    engine
        .create_booking(BookingRequest::new(
            session.user(),
            StoreId(1),
            "2024-05-01",
            3,
            "18:00",
        ))
        .unwrap();
    engine
        .submit_review(StoreId(1), session.user(), 5, "Lovely")
        .unwrap();

    let snapshot = engine.snapshot();

    let restored = Engine::new();
    restored.load_snapshot(snapshot.clone()).unwrap();
    assert_eq!(restored.snapshot(), snapshot);

    // The restored dataset behaves, not just compares: login works, the
    // booking is in the history, availability carried over
    let login = restored.login("alice", "secret").unwrap();
    assert_eq!(login.user(), session.user());
    assert_eq!(restored.bookings_for_user(session.user()).unwrap().len(), 1);
    assert_eq!(
        restored.slots_for_store(StoreId(1)).unwrap()[0].availability,
        2
    );
    assert_eq!(restored.reviews_for_store(StoreId(1)).unwrap().len(), 1);
}

#[test]
fn test_snapshot_json_is_portable() {
    let engine = seeded_engine();
    let json = engine.snapshot_json().unwrap();

    let restored = Engine::new();
    restored.load_snapshot_json(&json).unwrap();
    assert_eq!(restored.stats().store_count, 1);
    assert_eq!(restored.stats().slot_count, 2);
}

#[test]
fn test_watches_survive_snapshot_load() {
    let engine = seeded_engine();
    let handle = engine.watch(WatchKey::slots_for_store(StoreId(1))).unwrap();
    handle.recv_timeout(Duration::from_millis(200)).unwrap();

    let mut snapshot = engine.snapshot();
    snapshot.slots[0].availability = 1;
    engine.load_snapshot(snapshot).unwrap();

    // The load wakes the watcher with the replaced rows
    let update = handle.recv_timeout(Duration::from_millis(200)).unwrap();
    assert_eq!(update.value.slots().unwrap()[0].availability, 1);

    // New writes keep flowing after the load
    engine.reduce_availability(StoreId(1), "18:00", 1).unwrap();
    let update = handle.recv_timeout(Duration::from_millis(200)).unwrap();
    assert_eq!(update.value.slots().unwrap()[0].availability, 0);
}

// --- Stats ---

#[test]
fn test_stats_count_rows_per_table() {
    let engine = seeded_engine();
    let session = engine.register(NewUser::new("alice", "pw")).unwrap();
    engine
        .create_booking(BookingRequest::new(
            session.user(),
            StoreId(1),
            "2024-05-01",
            2,
            "18:00",
        ))
        .unwrap();
    engine
        .submit_review(StoreId(1), session.user(), 3, "fine")
        .unwrap();

    let stats = engine.stats();
    assert_eq!(stats.user_count, 1);
    assert_eq!(stats.store_count, 1);
    assert_eq!(stats.slot_count, 2);
    assert_eq!(stats.booking_count, 1);
    assert_eq!(stats.review_count, 1);
    assert!(stats.last_committed.0 >= 6);
}
