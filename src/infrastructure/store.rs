//! The persistent state model: one active class, an append-only history
//! and the admin credential, each under a fixed key.
//!
//! Every operation holds one mutex plus the backend's own lock for its
//! whole duration, so compound operations (history append, archival, class
//! replacement, wipe) are never interleaved with other callers, in this
//! process or another one sharing the medium.

use super::persistence::{BackendLock, KeyValueStore, MemoryStore, StorageError};
use crate::domain::{CheckInError, CheckInResult, ClassSession};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

pub const ACTIVE_CLASS_KEY: &str = "checkin_current_class";
pub const HISTORY_KEY: &str = "checkin_class_history";
pub const ADMIN_CREDENTIAL_KEY: &str = "checkin_admin_password";

/// Credential used until an admin sets another one.
pub const DEFAULT_ADMIN_CREDENTIAL: &str = "admin123";

#[derive(Debug)]
pub struct StateStore {
    backend: Mutex<Box<dyn KeyValueStore>>,
}

impl StateStore {
    /// Wraps a backend and stores the default admin credential if none is set.
    pub fn open(backend: impl KeyValueStore + 'static) -> CheckInResult<Self> {
        let store = Self {
            backend: Mutex::new(Box::new(backend)),
        };
        {
            let mut backend = store.lock()?;
            if backend.get(ADMIN_CREDENTIAL_KEY)?.is_none() {
                write(&mut **backend, ADMIN_CREDENTIAL_KEY, &DEFAULT_ADMIN_CREDENTIAL)?;
                info!("initialized default admin credential");
            }
        }
        Ok(store)
    }

    /// A fresh store backed by memory.
    pub fn in_memory() -> CheckInResult<Self> {
        Self::open(MemoryStore::new())
    }

    fn lock(&self) -> CheckInResult<Locked<'_>> {
        let backend = self
            .backend
            .lock()
            .map_err(|_| CheckInError::from(StorageError::Poisoned))?;
        let file_lock = backend.acquire_lock()?;
        Ok(Locked {
            _file_lock: file_lock,
            backend,
        })
    }

    /// The active session, or `None`. Unreadable data is logged and
    /// reported as absent.
    pub fn get_active_session(&self) -> Option<ClassSession> {
        let backend = self.lock().ok()?;
        read_or_absent(&**backend, ACTIVE_CLASS_KEY)
    }

    /// Overwrites the active slot.
    pub fn save_active_session(&self, session: &ClassSession) -> CheckInResult<()> {
        let mut backend = self.lock()?;
        write(&mut **backend, ACTIVE_CLASS_KEY, session)?;
        Ok(())
    }

    pub fn clear_active_session(&self) -> CheckInResult<()> {
        let mut backend = self.lock()?;
        backend.remove(ACTIVE_CLASS_KEY)?;
        Ok(())
    }

    /// Reads the active session and applies `update` to it, writing the
    /// result back only if `update` succeeds. The lock is held throughout.
    pub fn update_active_session<T, F>(&self, update: F) -> CheckInResult<T>
    where
        F: FnOnce(&mut ClassSession) -> CheckInResult<T>,
    {
        let mut backend = self.lock()?;
        let mut session: ClassSession =
            read_or_absent(&**backend, ACTIVE_CLASS_KEY).ok_or(CheckInError::NoActiveSession)?;
        let outcome = update(&mut session)?;
        write(&mut **backend, ACTIVE_CLASS_KEY, &session)?;
        Ok(outcome)
    }

    /// Appends to the history record.
    ///
    /// An unreadable history fails the append rather than being replaced.
    pub fn append_to_history(&self, session: &ClassSession) -> CheckInResult<()> {
        let mut backend = self.lock()?;
        append(&mut **backend, session)?;
        Ok(())
    }

    /// Archived sessions, oldest first. Unreadable data reads as empty.
    pub fn get_history(&self) -> Vec<ClassSession> {
        match self.lock() {
            Ok(backend) => read_or_absent(&**backend, HISTORY_KEY).unwrap_or_default(),
            Err(_) => Vec::new(),
        }
    }

    /// Makes `session` the active class.
    ///
    /// A class already in the active slot is first shown to `may_replace`;
    /// if that returns an error nothing is written. Otherwise the old class
    /// is stamped with `at` and appended to history before the new one
    /// overwrites the slot. Returns the archived class, if any.
    pub fn replace_active_session<F>(
        &self,
        session: &ClassSession,
        at: DateTime<Utc>,
        may_replace: F,
    ) -> CheckInResult<Option<ClassSession>>
    where
        F: FnOnce(&ClassSession) -> CheckInResult<()>,
    {
        let mut backend = self.lock()?;
        let archived = match read_or_absent::<ClassSession>(&**backend, ACTIVE_CLASS_KEY) {
            Some(mut existing) => {
                may_replace(&existing)?;
                existing.archived_at = Some(at);
                append(&mut **backend, &existing)?;
                info!(id = %existing.id, name = %existing.name, "archived class being replaced");
                Some(existing)
            }
            None => None,
        };
        write(&mut **backend, ACTIVE_CLASS_KEY, session)?;
        Ok(archived)
    }

    /// Moves the active session into history, stamping `archived_at`.
    ///
    /// The session is appended before the active slot is cleared, so a
    /// failure in between leaves it in both places rather than neither.
    /// Returns the archived session, or `None` if nothing was active.
    pub fn archive_active_session(&self, at: DateTime<Utc>) -> CheckInResult<Option<ClassSession>> {
        let mut backend = self.lock()?;
        let Some(mut session) = read_or_absent::<ClassSession>(&**backend, ACTIVE_CLASS_KEY)
        else {
            return Ok(None);
        };
        session.archived_at = Some(at);
        append(&mut **backend, &session)?;
        backend.remove(ACTIVE_CLASS_KEY)?;
        info!(id = %session.id, name = %session.name, attendees = session.attendee_count(), "archived class");
        Ok(Some(session))
    }

    /// Deletes the active session, history and credential.
    pub fn wipe_all(&self) -> CheckInResult<()> {
        let mut backend = self.lock()?;
        for key in [ACTIVE_CLASS_KEY, HISTORY_KEY, ADMIN_CREDENTIAL_KEY] {
            backend.remove(key)?;
        }
        warn!("wiped all stored data");
        Ok(())
    }

    /// The stored credential, or the default when none is stored.
    ///
    /// An unreadable record is an error, never the default.
    pub fn get_admin_credential(&self) -> CheckInResult<String> {
        let backend = self.lock()?;
        let stored = read::<String>(&**backend, ADMIN_CREDENTIAL_KEY)?;
        Ok(stored.unwrap_or_else(|| DEFAULT_ADMIN_CREDENTIAL.to_string()))
    }

    pub fn set_admin_credential(&self, credential: &str) -> CheckInResult<()> {
        let mut backend = self.lock()?;
        write(&mut **backend, ADMIN_CREDENTIAL_KEY, &credential)?;
        info!("admin credential changed");
        Ok(())
    }

    /// Plain-text equality against the stored credential. Rejects every
    /// candidate while the stored record cannot be read.
    pub fn verify_admin_credential(&self, candidate: &str) -> bool {
        match self.get_admin_credential() {
            Ok(stored) => candidate == stored,
            Err(e) => {
                warn!(error = %e, "admin credential unreadable, rejecting");
                false
            }
        }
    }
}

/// Store access held for the length of one operation. The file lock is
/// released before the mutex.
struct Locked<'a> {
    _file_lock: BackendLock,
    backend: MutexGuard<'a, Box<dyn KeyValueStore>>,
}

impl Deref for Locked<'_> {
    type Target = Box<dyn KeyValueStore>;

    fn deref(&self) -> &Self::Target {
        &self.backend
    }
}

impl DerefMut for Locked<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.backend
    }
}

fn read<T: DeserializeOwned>(backend: &dyn KeyValueStore, key: &str) -> Result<Option<T>, StorageError> {
    match backend.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Corrupt {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

fn read_or_absent<T: DeserializeOwned>(backend: &dyn KeyValueStore, key: &str) -> Option<T> {
    match read(backend, key) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "treating unreadable record as absent");
            None
        }
    }
}

fn write<T: Serialize + ?Sized>(
    backend: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
        key: key.to_string(),
        source,
    })?;
    backend.set(key, &json)
}

fn append(backend: &mut dyn KeyValueStore, session: &ClassSession) -> Result<(), StorageError> {
    let mut history: Vec<ClassSession> = read(backend, HISTORY_KEY)?.unwrap_or_default();
    history.push(session.clone());
    debug!(len = history.len(), "appending to history");
    write(backend, HISTORY_KEY, &history)
}
