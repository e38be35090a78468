//! Session workflows: class creation, attendee check-in, listing and
//! export, and the admin reset operations.
//!
//! Each workflow builds a candidate record, runs the validation rules and
//! only then writes through the state store. A rejected candidate leaves
//! stored state untouched.

use crate::domain::{
    Attendee, AttendeeDraft, CheckInError, CheckInResult, ClassDraft, ClassSession, Clock,
    IdGenerator, SystemClock, UuidGenerator, export_filename, validate_attendee, validate_class,
    write_csv,
};
use crate::infrastructure::StateStore;
use chrono::{DateTime, Local, Utc};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Whether the user has agreed to an operation that replaces or deletes data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Pending,
    Confirmed,
}

pub struct CheckInService {
    store: StateStore,
    clock: Box<dyn Clock>,
    ids: Box<dyn IdGenerator>,
}

impl std::fmt::Debug for CheckInService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckInService")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl CheckInService {
    pub fn new(
        store: StateStore,
        clock: impl Clock + 'static,
        ids: impl IdGenerator + 'static,
    ) -> Self {
        Self {
            store,
            clock: Box::new(clock),
            ids: Box::new(ids),
        }
    }

    /// Wall-clock time and random UUIDs.
    pub fn with_system_defaults(store: StateStore) -> Self {
        Self::new(store, SystemClock, UuidGenerator)
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn now(&self) -> DateTime<Local> {
        self.clock.now()
    }

    /// Validates and stores a new active class.
    ///
    /// An existing active class is archived first, but only with
    /// `Confirmation::Confirmed`; otherwise `ConfirmationRequired` is
    /// returned and nothing changes. The check and the swap happen under
    /// one store lock.
    pub fn create_class(
        &self,
        draft: &ClassDraft,
        confirmation: Confirmation,
    ) -> CheckInResult<ClassSession> {
        let now = self.clock.now();
        let schedule = validate_class(draft, now.naive_local())?;
        let now = now.with_timezone(&Utc);

        let session = ClassSession::new(self.ids.next_id(), schedule, now);
        self.store.replace_active_session(&session, now, |existing| {
            if confirmation == Confirmation::Confirmed {
                Ok(())
            } else {
                Err(CheckInError::ConfirmationRequired(format!(
                    "archive the active class \"{}\"",
                    existing.name
                )))
            }
        })?;
        info!(id = %session.id, name = %session.name, date = %session.date, "created class");
        Ok(session)
    }

    /// Registers an attendee in the active class.
    ///
    /// The duplicate-email check runs after the draft validates and before
    /// the attendee is appended; both happen under the store lock.
    pub fn check_in(&self, draft: &AttendeeDraft) -> CheckInResult<Attendee> {
        let details = validate_attendee(draft)?;
        let now = self.clock.now().with_timezone(&Utc);

        let attendee = self.store.update_active_session(|session| {
            if session.has_attendee_email(&details.email) {
                return Err(CheckInError::DuplicateRegistration);
            }
            let attendee = Attendee::new(self.ids.next_id(), details, now);
            session.add_attendee(attendee.clone(), now);
            Ok(attendee)
        })?;
        info!(id = %attendee.id, name = %attendee.full_name, "checked in attendee");
        Ok(attendee)
    }

    pub fn active_session(&self) -> Option<ClassSession> {
        self.store.get_active_session()
    }

    /// Attendees of the active class in check-in order.
    pub fn attendees(&self) -> Vec<Attendee> {
        self.active_session()
            .map(|session| session.attendees)
            .unwrap_or_default()
    }

    /// Archived classes, oldest first.
    pub fn history(&self) -> Vec<ClassSession> {
        self.store.get_history()
    }

    /// Whether the active class is running right now.
    pub fn class_in_progress(&self) -> bool {
        let now = self.clock.now().naive_local();
        self.active_session()
            .is_some_and(|session| session.is_in_progress(now))
    }

    /// Class form defaults for the current time.
    pub fn suggested_class(&self) -> ClassDraft {
        ClassDraft::suggested(self.clock.now().naive_local())
    }

    /// Writes the active class's attendee CSV into `dir`, returning its path.
    pub fn export_csv(&self, dir: &Path) -> CheckInResult<PathBuf> {
        let session = self.active_session().ok_or(CheckInError::NoActiveSession)?;
        if session.attendees.is_empty() {
            return Err(CheckInError::NothingToExport);
        }

        let io_failure = |e: std::io::Error| CheckInError::StorageFailure(e.to_string());
        fs::create_dir_all(dir).map_err(io_failure)?;
        let path = dir.join(export_filename(&session));
        let file = File::create(&path).map_err(io_failure)?;
        write_csv(&session, BufWriter::new(file))?;

        info!(path = %path.display(), rows = session.attendee_count(), "exported attendees");
        Ok(path)
    }

    pub fn verify_admin(&self, credential: &str) -> CheckInResult<()> {
        if self.store.verify_admin_credential(credential) {
            Ok(())
        } else {
            warn!("rejected admin credential");
            Err(CheckInError::AuthenticationFailure)
        }
    }

    /// Archives the active class.
    pub fn reset_session(
        &self,
        credential: &str,
        confirmation: Confirmation,
    ) -> CheckInResult<ClassSession> {
        self.verify_admin(credential)?;
        let active = self.active_session().ok_or(CheckInError::NoActiveSession)?;
        if confirmation != Confirmation::Confirmed {
            return Err(CheckInError::ConfirmationRequired(format!(
                "move \"{}\" to history",
                active.name
            )));
        }
        let now = self.clock.now().with_timezone(&Utc);
        self.store
            .archive_active_session(now)?
            .ok_or(CheckInError::NoActiveSession)
    }

    /// Deletes every class, attendee and the admin credential. Irreversible.
    pub fn wipe_all(&self, credential: &str, confirmation: Confirmation) -> CheckInResult<()> {
        self.verify_admin(credential)?;
        if confirmation != Confirmation::Confirmed {
            return Err(CheckInError::ConfirmationRequired("wipe all data".to_string()));
        }
        self.store.wipe_all()
    }

    pub fn change_admin_credential(&self, current: &str, new: &str) -> CheckInResult<()> {
        self.verify_admin(current)?;
        if new.is_empty() {
            return Err(CheckInError::MissingField("credential"));
        }
        self.store.set_admin_credential(new)
    }
}
