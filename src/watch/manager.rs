//! Watch manager: evaluates keyed queries and broadcasts changes.

use crate::db::{Database, TableKind};
use crate::error::Result;
use crate::types::Sequence;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use super::types::{WatchConfig, WatchHandle, WatchId, WatchKey, WatchUpdate, WatchValue};

/// One watcher's send side. `stash` is a clone of the watcher's receiver,
/// used to displace the oldest queued update when the buffer is full. The
/// stash keeps the channel open even after the handle is dropped, so
/// liveness is tracked by the shared `alive` flag instead of disconnects.
struct Watcher {
    id: WatchId,
    sender: Sender<WatchUpdate>,
    stash: Receiver<WatchUpdate>,
    alive: Arc<AtomicBool>,
}

impl Watcher {
    /// Deliver an update, displacing queued ones as needed so the latest
    /// value wins. Returns false only when the handle is gone.
    fn send_latest(&self, update: WatchUpdate) -> bool {
        if !self.alive.load(Ordering::Relaxed) {
            return false;
        }
        let mut update = update;
        loop {
            match self.sender.try_send(update) {
                Ok(()) => return true,
                Err(TrySendError::Full(back)) => {
                    let _ = self.stash.try_recv();
                    update = back;
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
    }
}

/// Per-key state: the watchers sharing one key and the last value they
/// were shown. `last` advances only together with a delivery or an
/// equal-value suppression.
struct KeyState {
    last: Option<(WatchValue, Sequence)>,
    watchers: Vec<Watcher>,
}

impl KeyState {
    /// Deliver one update to every watcher, pruning any whose handle is
    /// gone.
    fn fan_out(&mut self, key: &WatchKey, update: WatchUpdate) {
        let mut dropped = Vec::new();
        for watcher in &self.watchers {
            if !watcher.send_latest(update.clone()) {
                dropped.push(watcher.id);
            }
        }
        if !dropped.is_empty() {
            self.watchers.retain(|w| !dropped.contains(&w.id));
            debug!(?key, count = dropped.len(), "pruned disconnected watchers");
        }
    }
}

/// Broadcasts keyed query results to watchers.
///
/// Each key is evaluated at most once per relevant commit no matter how
/// many watchers share it. Evaluations capture `(rows, sequence)` under
/// one table read lock; a result equal to the cached last value is
/// suppressed. The cache never expires and can be peeked with
/// [`WatchManager::last_value`] without subscribing.
pub struct WatchManager {
    db: Arc<Database>,
    keys: RwLock<HashMap<WatchKey, Arc<Mutex<KeyState>>>>,
    next_id: AtomicU64,
}

impl WatchManager {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            keys: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Start watching a key.
    ///
    /// The current value is evaluated and delivered immediately, then every
    /// relevant commit delivers at most one update. A committed change the
    /// broadcast has not reached yet is flushed to the key's existing
    /// watchers first. With the default buffer of 1 a slow consumer always
    /// reads the newest value; intermediates may be coalesced away but
    /// delivery order never reverses.
    pub fn subscribe(&self, key: WatchKey, config: WatchConfig) -> Result<WatchHandle> {
        key.validate()?;

        let id = WatchId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(config.buffer_size.max(1));
        let alive = Arc::new(AtomicBool::new(true));

        let state = self.key_state(&key);
        let mut state = state.lock();

        let (value, sequence) = self.evaluate(&key);
        // The fresh evaluation can pick up a commit whose table_changed has
        // not run yet. That late notification lands on the sequence check,
        // so the change must reach existing watchers before the cache moves
        // past it.
        let pending = state
            .last
            .as_ref()
            .map_or(false, |(last_value, last_sequence)| {
                sequence > *last_sequence && value != *last_value
            });
        if pending {
            state.fan_out(
                &key,
                WatchUpdate {
                    key: key.clone(),
                    value: value.clone(),
                    sequence,
                },
            );
        }
        state.last = Some((value.clone(), sequence));

        let watcher = Watcher {
            id,
            sender,
            stash: receiver.clone(),
            alive: alive.clone(),
        };
        // Catch-up: the new watcher sees the current value right away.
        watcher.send_latest(WatchUpdate {
            key: key.clone(),
            value,
            sequence,
        });
        state.watchers.push(watcher);

        debug!(?key, watch_id = id.0, "watch subscribed");
        Ok(WatchHandle {
            id,
            key,
            receiver,
            alive,
        })
    }

    /// Stop watching. The key's cached value stays available.
    pub fn unsubscribe(&self, handle: &WatchHandle) {
        let state = match self.keys.read().get(&handle.key) {
            Some(state) => state.clone(),
            None => return,
        };
        let mut state = state.lock();
        state.watchers.retain(|w| w.id != handle.id);
        debug!(key = ?handle.key, watch_id = handle.id.0, "watch unsubscribed");
    }

    /// Last observed value for a key, if it was ever evaluated. Never
    /// blocks on the database and never triggers an evaluation.
    pub fn last_value(&self, key: &WatchKey) -> Option<WatchValue> {
        let state = self.keys.read().get(key)?.clone();
        let state = state.lock();
        state.last.as_ref().map(|(value, _)| value.clone())
    }

    /// Number of keys ever watched (the cache size).
    pub fn key_count(&self) -> usize {
        self.keys.read().len()
    }

    /// Number of live watchers on one key.
    pub fn watcher_count(&self, key: &WatchKey) -> usize {
        match self.keys.read().get(key) {
            Some(state) => state.lock().watchers.len(),
            None => 0,
        }
    }

    // --- Change propagation ---

    /// Re-evaluate every watched key that reads from `table`.
    ///
    /// Writers call this after committing. Keys without watchers are
    /// skipped; their cache refreshes on the next subscribe.
    pub fn table_changed(&self, table: TableKind) {
        let affected: Vec<(WatchKey, Arc<Mutex<KeyState>>)> = self
            .keys
            .read()
            .iter()
            .filter(|(key, _)| key.table() == table)
            .map(|(key, state)| (key.clone(), state.clone()))
            .collect();

        for (key, state) in affected {
            let mut state = state.lock();
            if state.watchers.is_empty() {
                continue;
            }

            let (value, sequence) = self.evaluate(&key);
            if let Some((last_value, last_sequence)) = &state.last {
                if sequence <= *last_sequence {
                    continue;
                }
                if value == *last_value {
                    // Same value at a newer commit: remember the sequence,
                    // deliver nothing.
                    state.last = Some((value, sequence));
                    debug!(?key, seq = sequence.0, "watch update suppressed");
                    continue;
                }
            }
            state.last = Some((value.clone(), sequence));

            state.fan_out(
                &key,
                WatchUpdate {
                    key: key.clone(),
                    value,
                    sequence,
                },
            );
        }
    }

    /// Evaluate a key's query. Rows and sequence come from one read-lock
    /// capture, so the pair is internally consistent.
    fn evaluate(&self, key: &WatchKey) -> (WatchValue, Sequence) {
        match key {
            WatchKey::UserName { user } => {
                let (row, seq) = self.db.users().value(user.0);
                (
                    WatchValue::Text {
                        value: row.map(|u| u.username),
                    },
                    seq,
                )
            }
            WatchKey::UserEmail { user } => {
                let (row, seq) = self.db.users().value(user.0);
                (
                    WatchValue::Text {
                        value: row.map(|u| u.email),
                    },
                    seq,
                )
            }
            WatchKey::StoreName { store } => {
                let (row, seq) = self.db.stores().value(store.0);
                (
                    WatchValue::Text {
                        value: row.map(|s| s.name),
                    },
                    seq,
                )
            }
            WatchKey::StoreLocation { store } => {
                let (row, seq) = self.db.stores().value(store.0);
                (
                    WatchValue::Text {
                        value: row.map(|s| s.location),
                    },
                    seq,
                )
            }
            WatchKey::StoreList => {
                let (stores, seq) = self.db.stores().snapshot(|_| true);
                (WatchValue::Stores { stores }, seq)
            }
            WatchKey::SlotsForStore { store } => {
                let (slots, seq) = self.db.slots().snapshot(|s| s.store == *store);
                (WatchValue::Slots { slots }, seq)
            }
            WatchKey::BookingsForUser { user } => {
                let (bookings, seq) = self.db.bookings().snapshot(|b| b.user == *user);
                (WatchValue::Bookings { bookings }, seq)
            }
        }
    }

    fn key_state(&self, key: &WatchKey) -> Arc<Mutex<KeyState>> {
        if let Some(state) = self.keys.read().get(key) {
            return state.clone();
        }
        let mut keys = self.keys.write();
        keys.entry(key.clone())
            .or_insert_with(|| {
                Arc::new(Mutex::new(KeyState {
                    last: None,
                    watchers: Vec::new(),
                }))
            })
            .clone()
    }
}
