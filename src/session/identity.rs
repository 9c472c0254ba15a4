//! Login and registration.

use crate::db::{Database, TableKind};
use crate::error::{EngineError, Result};
use crate::types::{NewUser, Session, User, UserId};
use crate::watch::{WatchConfig, WatchHandle, WatchKey, WatchManager};
use rand::Rng;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How many random ids registration tries before giving up.
const MAX_REGISTER_ATTEMPTS: u32 = 16;

/// Resolves credentials to sessions and registers new accounts.
#[derive(Clone)]
pub struct Identity {
    db: Arc<Database>,
    watches: Arc<WatchManager>,
}

impl Identity {
    pub(crate) fn new(db: Arc<Database>, watches: Arc<WatchManager>) -> Self {
        Self { db, watches }
    }

    /// Resolve credentials to a session.
    ///
    /// The first row matching both fields wins. The comparison is exact
    /// and unhashed; feed this engine hashed passwords if that matters to
    /// you.
    pub fn login(&self, username: &str, password: &str) -> Result<Session> {
        let found = self
            .db
            .users()
            .scan(|u| u.username == username && u.password == password)
            .into_iter()
            .next();
        match found {
            Some(user) => {
                info!(user = %user.id, "login succeeded");
                Ok(Session::start(user.id))
            }
            None => {
                debug!(username, "login failed");
                Err(EngineError::CredentialsNotFound)
            }
        }
    }

    /// Register a new account under a fresh random id and start a session
    /// for it.
    ///
    /// Uniqueness is enforced by the storage insert: a collision retries
    /// with a new id, up to [`MAX_REGISTER_ATTEMPTS`] times.
    pub fn register(&self, profile: NewUser) -> Result<Session> {
        let mut rng = rand::thread_rng();
        for attempt in 1..=MAX_REGISTER_ATTEMPTS {
            let user = User {
                id: UserId(rng.gen_range(1..i64::MAX)),
                username: profile.username.clone(),
                password: profile.password.clone(),
                phone_number: profile.phone_number.clone(),
                email: profile.email.clone(),
            };
            match self.db.users().insert(user) {
                Ok((user, _)) => {
                    self.watches.table_changed(TableKind::Users);
                    info!(user = %user.id, attempt, "user registered");
                    return Ok(Session::start(user.id));
                }
                Err(EngineError::Conflict { .. }) => {
                    warn!(attempt, "registration id collision, retrying");
                }
                Err(e) => return Err(e),
            }
        }
        Err(EngineError::IdSpaceExhausted(MAX_REGISTER_ATTEMPTS))
    }

    /// Profile point read.
    pub fn user(&self, id: UserId) -> Result<Option<User>> {
        if !id.is_valid() {
            return Err(EngineError::InvalidId(id.0));
        }
        Ok(self.db.users().get(id.0))
    }

    /// Live query over a user's display name.
    pub fn watch_username(&self, user: UserId) -> Result<WatchHandle> {
        self.watches
            .subscribe(WatchKey::user_name(user), WatchConfig::default())
    }

    /// Live query over a user's email address.
    pub fn watch_email(&self, user: UserId) -> Result<WatchHandle> {
        self.watches
            .subscribe(WatchKey::user_email(user), WatchConfig::default())
    }
}
