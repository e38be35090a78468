//! Application state management for the terminal check-in front end.
//!
//! This module holds the screen the user is on, the form buffers and the
//! status line, and turns user intents into session workflow calls.

use super::form::Form;
use super::workflows::{CheckInService, Confirmation};
use crate::domain::{CheckInError, CheckInResult, ClassDraft, format_date};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Represents the screen the application is showing.
///
/// The mode determines how key presses are interpreted and what is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Home screen with the active class summary
    Normal,
    /// Class setup form
    ClassForm,
    /// Attendee check-in form
    CheckInForm,
    /// Attendee list of the active class
    Attendees,
    /// Admin password prompt
    AdminLogin,
    /// Admin panel with class history
    AdminPanel,
    /// New admin password prompt
    ChangeCredential,
    /// Yes/no dialog for a pending destructive action
    Confirm,
    /// Help screen is displayed
    Help,
}

/// A destructive action waiting for the user's yes or no.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    /// Archive the active class and create this one instead.
    ReplaceClass(ClassDraft),
    /// Move the active class to history.
    ResetSession,
    /// Delete everything. Asked twice; `final_check` marks the second ask.
    WipeAll { final_check: bool },
}

/// Main application state.
#[derive(Debug)]
pub struct App {
    pub service: CheckInService,
    pub mode: AppMode,
    /// Form being edited in `ClassForm` / `CheckInForm`
    pub form: Form,
    /// Password buffer for `AdminLogin` and `ChangeCredential`
    pub secret_input: String,
    /// Action awaiting confirmation in `Confirm`
    pub pending: Option<PendingAction>,
    /// Temporary status message to display
    pub status_message: Option<String>,
    /// Scroll offset for the attendee list and admin history
    pub list_scroll: usize,
    /// Scroll position in help text
    pub help_scroll: usize,
    /// Directory CSV exports are written to
    pub export_dir: PathBuf,
    admin_credential: Option<String>,
}

impl App {
    pub fn new(service: CheckInService, export_dir: PathBuf) -> Self {
        Self {
            service,
            mode: AppMode::Normal,
            form: Form::default(),
            secret_input: String::new(),
            pending: None,
            status_message: None,
            list_scroll: 0,
            help_scroll: 0,
            export_dir,
            admin_credential: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.admin_credential.is_some()
    }

    /// Opens the class setup form with suggested date and times.
    pub fn start_class_form(&mut self) {
        self.form = Form::class(&self.service.suggested_class());
        self.mode = AppMode::ClassForm;
        self.status_message = None;
    }

    /// Opens the check-in form, if there is a class to check into.
    pub fn start_check_in(&mut self) {
        if self.service.active_session().is_none() {
            self.status_message =
                Some("No active class. Create a class before checking in attendees.".to_string());
            return;
        }
        self.form = Form::attendee();
        self.mode = AppMode::CheckInForm;
        self.status_message = None;
    }

    pub fn show_attendees(&mut self) {
        self.mode = AppMode::Attendees;
        self.list_scroll = 0;
        self.status_message = None;
    }

    pub fn show_help(&mut self) {
        self.mode = AppMode::Help;
        self.help_scroll = 0;
    }

    /// Returns to the home screen, dropping any admin session.
    pub fn go_home(&mut self) {
        self.mode = AppMode::Normal;
        self.form = Form::default();
        self.secret_input.clear();
        self.pending = None;
        self.admin_credential = None;
    }

    /// Submits whichever form is open.
    pub fn submit_form(&mut self) {
        match self.mode {
            AppMode::ClassForm => {
                let draft = self.form.class_draft();
                self.create_class(draft, Confirmation::Pending);
            }
            AppMode::CheckInForm => self.check_in(),
            _ => {}
        }
    }

    fn create_class(&mut self, draft: ClassDraft, confirmation: Confirmation) {
        match self.service.create_class(&draft, confirmation) {
            Ok(session) => {
                self.status_message = Some(format!(
                    "Class \"{}\" has been created for {}.",
                    session.name,
                    format_date(session.date)
                ));
                self.form = Form::default();
                self.mode = AppMode::Normal;
            }
            Err(CheckInError::ConfirmationRequired(what)) => {
                self.status_message = Some(format!("Creating a new class will {}.", what));
                self.pending = Some(PendingAction::ReplaceClass(draft));
                self.mode = AppMode::Confirm;
            }
            Err(err) => self.report_error(err),
        }
    }

    fn check_in(&mut self) {
        match self.service.check_in(&self.form.attendee_draft()) {
            Ok(attendee) => {
                self.status_message =
                    Some(format!("{} has been checked in successfully.", attendee.full_name));
                self.form = Form::attendee();
            }
            Err(err) => self.report_error(err),
        }
    }

    pub fn export_csv(&mut self) {
        match self.service.export_csv(&self.export_dir) {
            Ok(path) => self.status_message = Some(format!("Exported to {}", path.display())),
            Err(err) => self.report_error(err),
        }
    }

    pub fn start_admin_login(&mut self) {
        self.secret_input.clear();
        self.mode = AppMode::AdminLogin;
        self.status_message = None;
    }

    pub fn submit_admin_login(&mut self) {
        let candidate = std::mem::take(&mut self.secret_input);
        match self.service.verify_admin(&candidate) {
            Ok(()) => {
                self.admin_credential = Some(candidate);
                self.mode = AppMode::AdminPanel;
                self.list_scroll = 0;
                self.status_message = None;
            }
            Err(err) => self.report_error(err),
        }
    }

    pub fn start_change_credential(&mut self) {
        if self.is_admin() {
            self.secret_input.clear();
            self.mode = AppMode::ChangeCredential;
        }
    }

    pub fn submit_change_credential(&mut self) {
        let Some(current) = self.admin_credential.clone() else {
            return;
        };
        let new = std::mem::take(&mut self.secret_input);
        match self.service.change_admin_credential(&current, &new) {
            Ok(()) => {
                self.admin_credential = Some(new);
                self.status_message = Some("Admin password changed.".to_string());
                self.mode = AppMode::AdminPanel;
            }
            Err(err) => self.report_error(err),
        }
    }

    /// Asks to move the active class to history.
    pub fn request_reset_session(&mut self) {
        let Some(credential) = self.admin_credential.clone() else {
            return;
        };
        match self.service.reset_session(&credential, Confirmation::Pending) {
            Err(CheckInError::ConfirmationRequired(what)) => {
                self.status_message = Some(format!("Are you sure you want to {}?", what));
                self.pending = Some(PendingAction::ResetSession);
                self.mode = AppMode::Confirm;
            }
            Ok(_) => {}
            Err(err) => self.report_error(err),
        }
    }

    /// Asks to delete all data; the user has to confirm twice.
    pub fn request_wipe_all(&mut self) {
        if !self.is_admin() {
            return;
        }
        self.status_message =
            Some("Are you sure you want to clear ALL data? This cannot be undone.".to_string());
        self.pending = Some(PendingAction::WipeAll { final_check: false });
        self.mode = AppMode::Confirm;
    }

    /// Answers "yes" to the pending action.
    pub fn confirm(&mut self) {
        let Some(pending) = self.pending.take() else {
            self.mode = AppMode::Normal;
            return;
        };
        debug!(?pending, "confirmed");
        match pending {
            PendingAction::ReplaceClass(draft) => {
                self.mode = AppMode::ClassForm;
                self.create_class(draft, Confirmation::Confirmed);
            }
            PendingAction::ResetSession => {
                let credential = self.admin_credential.clone().unwrap_or_default();
                let result = self.service.reset_session(&credential, Confirmation::Confirmed);
                self.mode = AppMode::AdminPanel;
                self.report(result, |session| {
                    format!("Class \"{}\" moved to history.", session.name)
                });
            }
            PendingAction::WipeAll { final_check: false } => {
                self.status_message = Some(
                    "This will permanently delete all classes and attendee data. Are you absolutely sure?"
                        .to_string(),
                );
                self.pending = Some(PendingAction::WipeAll { final_check: true });
            }
            PendingAction::WipeAll { final_check: true } => {
                let credential = self.admin_credential.clone().unwrap_or_default();
                let result = self.service.wipe_all(&credential, Confirmation::Confirmed);
                let wiped = result.is_ok();
                self.report(result, |()| "All data has been cleared.".to_string());
                if wiped {
                    let message = self.status_message.take();
                    self.go_home();
                    self.status_message = message;
                } else {
                    self.mode = AppMode::AdminPanel;
                }
            }
        }
    }

    /// Answers "no" to the pending action.
    pub fn decline(&mut self) {
        self.mode = match self.pending.take() {
            Some(PendingAction::ReplaceClass(_)) => AppMode::ClassForm,
            Some(_) => AppMode::AdminPanel,
            None => AppMode::Normal,
        };
        self.status_message = None;
    }

    pub fn scroll_down(&mut self) {
        self.list_scroll += 1;
    }

    pub fn scroll_up(&mut self) {
        self.list_scroll = self.list_scroll.saturating_sub(1);
    }

    fn report<T>(&mut self, result: CheckInResult<T>, success: impl FnOnce(T) -> String) {
        match result {
            Ok(value) => self.status_message = Some(success(value)),
            Err(err) => self.report_error(err),
        }
    }

    fn report_error(&mut self, err: CheckInError) {
        if err.is_validation() {
            debug!(error = %err, mode = ?self.mode, "input rejected");
        } else {
            warn!(error = %err, mode = ?self.mode, "workflow failed");
        }
        self.status_message = Some(format!("Error: {}", user_message(&err)));
    }
}

/// Human-readable wording for workflow failures.
pub fn user_message(err: &CheckInError) -> String {
    match err {
        CheckInError::MissingField(field) => format!("{} is required.", field_label(field)),
        CheckInError::InvalidFormat(field) => {
            format!("Please enter a valid {}.", field_label(field).to_lowercase())
        }
        CheckInError::FieldTooLong(field) => {
            format!("{} must be 100 characters or fewer.", field_label(field))
        }
        CheckInError::DateInPast => "Class date cannot be in the past.".to_string(),
        CheckInError::StartTimeTooFarInPast => {
            "Start time cannot be more than 15 minutes in the past.".to_string()
        }
        CheckInError::InvalidTimeOrder => "End time must be after start time.".to_string(),
        CheckInError::DuplicateRegistration => {
            "This email address is already registered for this class.".to_string()
        }
        CheckInError::AuthenticationFailure => "Incorrect password. Please try again.".to_string(),
        CheckInError::NoActiveSession => "There is no active class.".to_string(),
        CheckInError::NothingToExport => "No attendee data to export.".to_string(),
        other => other.to_string(),
    }
}

fn field_label(field: &str) -> &str {
    match field {
        "name" => "Class name",
        "date" => "Class date",
        "startTime" => "Start time",
        "endTime" => "End time",
        "fullName" => "Full name",
        "company" => "Company name",
        "email" => "Email address",
        "phone" => "Phone number",
        "credential" => "Password",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FixedClock, SequentialIds};
    use crate::infrastructure::{DEFAULT_ADMIN_CREDENTIAL, StateStore};
    use chrono::NaiveDate;

    fn app() -> App {
        let now = NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let service = CheckInService::new(
            StateStore::in_memory().unwrap(),
            FixedClock::at(now),
            SequentialIds::new("id"),
        );
        App::new(service, PathBuf::from("."))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.form.insert_char(c);
        }
    }

    fn create_class(app: &mut App, name: &str) {
        app.start_class_form();
        type_text(app, name);
        app.submit_form();
    }

    fn log_in(app: &mut App) {
        app.start_admin_login();
        app.secret_input = DEFAULT_ADMIN_CREDENTIAL.to_string();
        app.submit_admin_login();
    }

    #[test]
    fn test_app_default_mode() {
        let app = app();
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.status_message.is_none());
        assert!(!app.is_admin());
    }

    #[test]
    fn test_class_form_uses_suggested_times() {
        let mut app = app();
        app.start_class_form();

        assert_eq!(app.mode, AppMode::ClassForm);
        assert_eq!(app.form.text("date"), "2026-10-16");
        assert_eq!(app.form.text("startTime"), "13:00");
        assert_eq!(app.form.text("endTime"), "14:00");
    }

    #[test]
    fn test_create_class_from_form() {
        let mut app = app();
        create_class(&mut app, "Intro to Welding");

        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.service.active_session().unwrap().name, "Intro to Welding");
        assert!(app.status_message.as_ref().unwrap().contains("has been created"));
    }

    #[test]
    fn test_invalid_class_stays_in_form() {
        let mut app = app();
        app.start_class_form();
        app.submit_form();

        assert_eq!(app.mode, AppMode::ClassForm);
        assert_eq!(app.status_message.as_deref(), Some("Error: Class name is required."));
        assert!(app.service.active_session().is_none());
    }

    #[test]
    fn test_replacing_class_asks_first() {
        let mut app = app();
        create_class(&mut app, "First");
        create_class(&mut app, "Second");

        assert_eq!(app.mode, AppMode::Confirm);
        assert!(matches!(app.pending, Some(PendingAction::ReplaceClass(_))));
        assert_eq!(app.service.active_session().unwrap().name, "First");

        app.decline();
        assert_eq!(app.mode, AppMode::ClassForm);
        assert_eq!(app.service.active_session().unwrap().name, "First");

        app.submit_form();
        app.confirm();
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.service.active_session().unwrap().name, "Second");
        assert_eq!(app.service.history().len(), 1);
    }

    #[test]
    fn test_check_in_requires_active_class() {
        let mut app = app();
        app.start_check_in();
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.status_message.as_ref().unwrap().starts_with("No active class"));
    }

    #[test]
    fn test_check_in_flow() {
        let mut app = app();
        create_class(&mut app, "Intro to Welding");
        app.start_check_in();
        assert_eq!(app.mode, AppMode::CheckInForm);

        type_text(&mut app, "Ada Lovelace");
        app.form.next_field();
        app.form.next_field();
        type_text(&mut app, "ADA@x.com");
        app.submit_form();

        assert_eq!(app.mode, AppMode::CheckInForm);
        assert_eq!(
            app.status_message.as_deref(),
            Some("Ada Lovelace has been checked in successfully.")
        );
        assert_eq!(app.form, Form::attendee());

        type_text(&mut app, "Impostor");
        app.form.focused = 2;
        type_text(&mut app, "ada@x.com");
        app.submit_form();
        assert_eq!(
            app.status_message.as_deref(),
            Some("Error: This email address is already registered for this class.")
        );
        assert_eq!(app.service.attendees().len(), 1);
    }

    #[test]
    fn test_admin_login() {
        let mut app = app();
        app.start_admin_login();
        app.secret_input = "guess".to_string();
        app.submit_admin_login();
        assert_eq!(app.mode, AppMode::AdminLogin);
        assert!(!app.is_admin());
        assert!(app.secret_input.is_empty());

        app.secret_input = DEFAULT_ADMIN_CREDENTIAL.to_string();
        app.submit_admin_login();
        assert_eq!(app.mode, AppMode::AdminPanel);
        assert!(app.is_admin());

        app.go_home();
        assert!(!app.is_admin());
    }

    #[test]
    fn test_reset_session_flow() {
        let mut app = app();
        create_class(&mut app, "Intro to Welding");
        log_in(&mut app);

        app.request_reset_session();
        assert_eq!(app.mode, AppMode::Confirm);
        app.confirm();

        assert_eq!(app.mode, AppMode::AdminPanel);
        assert!(app.service.active_session().is_none());
        assert_eq!(app.service.history().len(), 1);
        assert_eq!(
            app.status_message.as_deref(),
            Some("Class \"Intro to Welding\" moved to history.")
        );
    }

    #[test]
    fn test_wipe_all_needs_two_confirmations() {
        let mut app = app();
        create_class(&mut app, "Intro to Welding");
        log_in(&mut app);

        app.request_wipe_all();
        app.confirm();
        assert_eq!(app.mode, AppMode::Confirm);
        assert!(app.service.active_session().is_some());

        app.confirm();
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.service.active_session().is_none());
        assert!(!app.is_admin());
        assert_eq!(app.status_message.as_deref(), Some("All data has been cleared."));
    }

    #[test]
    fn test_declining_wipe_returns_to_panel() {
        let mut app = app();
        create_class(&mut app, "Intro to Welding");
        log_in(&mut app);

        app.request_wipe_all();
        app.decline();
        assert_eq!(app.mode, AppMode::AdminPanel);
        assert!(app.pending.is_none());
        assert!(app.service.active_session().is_some());
    }

    #[test]
    fn test_change_credential_flow() {
        let mut app = app();
        log_in(&mut app);
        app.start_change_credential();
        assert_eq!(app.mode, AppMode::ChangeCredential);

        app.secret_input = "n3w".to_string();
        app.submit_change_credential();
        assert_eq!(app.mode, AppMode::AdminPanel);
        assert!(app.service.verify_admin("n3w").is_ok());
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(
            user_message(&CheckInError::InvalidFormat("email")),
            "Please enter a valid email address."
        );
        assert_eq!(
            user_message(&CheckInError::FieldTooLong("company")),
            "Company name must be 100 characters or fewer."
        );
    }
}
