use thiserror::Error;

/// Failures surfaced by validation, the state store and the session workflows.
///
/// Validation variants are ordinary outcomes: the workflow reports them to
/// the user and leaves all stored state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckInError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("{0} has an invalid format")]
    InvalidFormat(&'static str),
    #[error("{0} must be at most 100 characters")]
    FieldTooLong(&'static str),
    #[error("class date cannot be in the past")]
    DateInPast,
    #[error("class start time is too far in the past")]
    StartTimeTooFarInPast,
    #[error("end time must be after start time")]
    InvalidTimeOrder,
    #[error("this email address is already registered for this class")]
    DuplicateRegistration,
    #[error("storage failure: {0}")]
    StorageFailure(String),
    #[error("incorrect admin password")]
    AuthenticationFailure,
    #[error("there is no active class")]
    NoActiveSession,
    /// The operation replaces or destroys data; the payload names it.
    #[error("confirmation required to {0}")]
    ConfirmationRequired(String),
    #[error("no attendee data to export")]
    NothingToExport,
}

impl CheckInError {
    /// True for the outcomes produced by the validation rules and the
    /// duplicate-email check.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CheckInError::MissingField(_)
                | CheckInError::InvalidFormat(_)
                | CheckInError::FieldTooLong(_)
                | CheckInError::DateInPast
                | CheckInError::StartTimeTooFarInPast
                | CheckInError::InvalidTimeOrder
                | CheckInError::DuplicateRegistration
        )
    }
}

pub type CheckInResult<T> = Result<T, CheckInError>;
