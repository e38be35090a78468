//! Business rules for class and attendee records.
//!
//! Each validator checks its rules in a fixed order and stops at the first
//! failure, so a draft that breaks several rules always reports the earliest
//! one. Validators are pure: "now" is passed in by the caller.

use super::errors::{CheckInError, CheckInResult};
use super::models::{
    AttendeeDetails, AttendeeDraft, ClassDraft, ClassSchedule, DATE_FORMAT, TIME_FORMAT,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use regex::Regex;
use std::sync::LazyLock;

/// Maximum length, in characters, of names and company.
pub const MAX_FIELD_LENGTH: usize = 100;

/// How far in the past a same-day class may start and still be created.
pub const GRACE_WINDOW_MINUTES: i64 = 15;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?\(?[\d\s\-()]{10,}$").expect("phone pattern compiles"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone)
}

/// Validates a class draft against local wall-clock time `now`.
///
/// Rule order: name, date, start and end presence; date not before today;
/// same-day start within the grace window; start before end; name length.
/// A present but unparseable date or time reports `InvalidFormat` just
/// before the date rules.
pub fn validate_class(draft: &ClassDraft, now: NaiveDateTime) -> CheckInResult<ClassSchedule> {
    let name = draft.name.trim();
    let date = draft.date.trim();
    let start_time = draft.start_time.trim();
    let end_time = draft.end_time.trim();

    if name.is_empty() {
        return Err(CheckInError::MissingField("name"));
    }
    if date.is_empty() {
        return Err(CheckInError::MissingField("date"));
    }
    if start_time.is_empty() {
        return Err(CheckInError::MissingField("startTime"));
    }
    if end_time.is_empty() {
        return Err(CheckInError::MissingField("endTime"));
    }

    let date = NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map_err(|_| CheckInError::InvalidFormat("date"))?;
    let start_time = NaiveTime::parse_from_str(start_time, TIME_FORMAT)
        .map_err(|_| CheckInError::InvalidFormat("startTime"))?;
    let end_time = NaiveTime::parse_from_str(end_time, TIME_FORMAT)
        .map_err(|_| CheckInError::InvalidFormat("endTime"))?;

    let today = now.date();
    if date < today {
        return Err(CheckInError::DateInPast);
    }
    if date == today {
        let earliest_start = now - TimeDelta::minutes(GRACE_WINDOW_MINUTES);
        if date.and_time(start_time) < earliest_start {
            return Err(CheckInError::StartTimeTooFarInPast);
        }
    }
    if start_time >= end_time {
        return Err(CheckInError::InvalidTimeOrder);
    }
    if name.chars().count() > MAX_FIELD_LENGTH {
        return Err(CheckInError::FieldTooLong("name"));
    }

    Ok(ClassSchedule {
        name: name.to_string(),
        date,
        start_time,
        end_time,
        description: non_empty(&draft.description),
    })
}

/// Validates an attendee draft. The duplicate-email rule needs the active
/// session and is checked by the check-in workflow after this passes.
pub fn validate_attendee(draft: &AttendeeDraft) -> CheckInResult<AttendeeDetails> {
    let full_name = draft.full_name.trim();
    let email = draft.email.trim();
    let company = non_empty(&draft.company);
    let phone = non_empty(&draft.phone);

    if full_name.is_empty() {
        return Err(CheckInError::MissingField("fullName"));
    }
    if email.is_empty() {
        return Err(CheckInError::MissingField("email"));
    }
    if !is_valid_email(email) {
        return Err(CheckInError::InvalidFormat("email"));
    }
    if let Some(phone) = &phone {
        if !is_valid_phone(phone) {
            return Err(CheckInError::InvalidFormat("phone"));
        }
    }
    if full_name.chars().count() > MAX_FIELD_LENGTH {
        return Err(CheckInError::FieldTooLong("fullName"));
    }
    if let Some(company) = &company {
        if company.chars().count() > MAX_FIELD_LENGTH {
            return Err(CheckInError::FieldTooLong("company"));
        }
    }

    Ok(AttendeeDetails {
        full_name: full_name.to_string(),
        company,
        email: email.to_string(),
        phone,
        future_interest: draft.future_interest,
    })
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap()
    }

    fn valid_class() -> ClassDraft {
        ClassDraft::new("Intro to Welding", "2026-10-16", "18:00", "20:00")
    }

    #[test]
    fn test_valid_class_is_accepted() {
        let schedule = validate_class(&valid_class().with_description("  bring gloves "), now())
            .unwrap();
        assert_eq!(schedule.name, "Intro to Welding");
        assert_eq!(schedule.start_time, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
        assert_eq!(schedule.description.as_deref(), Some("bring gloves"));
    }

    #[test]
    fn test_class_name_is_trimmed_and_required() {
        let mut draft = valid_class();
        draft.name = "   ".to_string();
        assert_eq!(validate_class(&draft, now()), Err(CheckInError::MissingField("name")));
    }

    #[test]
    fn test_class_first_failure_wins() {
        // Every rule is broken; the name check comes first.
        let draft = ClassDraft::new("", "", "", "");
        assert_eq!(validate_class(&draft, now()), Err(CheckInError::MissingField("name")));

        let draft = ClassDraft::new("x", "", "", "");
        assert_eq!(validate_class(&draft, now()), Err(CheckInError::MissingField("date")));

        let draft = ClassDraft::new("x", "2026-10-16", "", "");
        assert_eq!(validate_class(&draft, now()), Err(CheckInError::MissingField("startTime")));

        let draft = ClassDraft::new("x", "2026-10-16", "18:00", "");
        assert_eq!(validate_class(&draft, now()), Err(CheckInError::MissingField("endTime")));

        // Past date, reversed times and an over-long name: date wins.
        let long_name = "n".repeat(101);
        let draft = ClassDraft::new(long_name.clone(), "2026-10-15", "10:00", "09:00");
        assert_eq!(validate_class(&draft, now()), Err(CheckInError::DateInPast));

        // Too-early start today, reversed times and an over-long name.
        let draft = ClassDraft::new(long_name.clone(), "2026-10-16", "10:00", "09:00");
        assert_eq!(validate_class(&draft, now()), Err(CheckInError::StartTimeTooFarInPast));

        // Reversed times and an over-long name.
        let draft = ClassDraft::new(long_name.clone(), "2026-10-17", "10:00", "09:00");
        assert_eq!(validate_class(&draft, now()), Err(CheckInError::InvalidTimeOrder));

        let draft = ClassDraft::new(long_name, "2026-10-17", "09:00", "10:00");
        assert_eq!(validate_class(&draft, now()), Err(CheckInError::FieldTooLong("name")));
    }

    #[test]
    fn test_reversed_times_rejected() {
        let draft = ClassDraft::new("Intro to Welding", "2026-10-20", "10:00", "09:00");
        assert_eq!(validate_class(&draft, now()), Err(CheckInError::InvalidTimeOrder));

        let draft = ClassDraft::new("Intro to Welding", "2026-10-20", "10:00", "10:00");
        assert_eq!(validate_class(&draft, now()), Err(CheckInError::InvalidTimeOrder));
    }

    #[test]
    fn test_grace_window_boundaries() {
        // now is 14:00; 13:45 is exactly fifteen minutes ago.
        let draft = ClassDraft::new("Late", "2026-10-16", "13:45", "15:00");
        assert!(validate_class(&draft, now()).is_ok());

        let draft = ClassDraft::new("Late", "2026-10-16", "13:44", "15:00");
        assert_eq!(validate_class(&draft, now()), Err(CheckInError::StartTimeTooFarInPast));

        // The window only applies to classes held today.
        let draft = ClassDraft::new("Tomorrow", "2026-10-17", "06:00", "07:00");
        assert!(validate_class(&draft, now()).is_ok());
    }

    #[test]
    fn test_name_length_limit() {
        let draft = ClassDraft::new("n".repeat(100), "2026-10-17", "09:00", "10:00");
        assert!(validate_class(&draft, now()).is_ok());

        // Characters, not bytes.
        let draft = ClassDraft::new("é".repeat(100), "2026-10-17", "09:00", "10:00");
        assert!(validate_class(&draft, now()).is_ok());
    }

    #[test]
    fn test_malformed_date_and_time() {
        let draft = ClassDraft::new("x", "next week", "09:00", "10:00");
        assert_eq!(validate_class(&draft, now()), Err(CheckInError::InvalidFormat("date")));

        let draft = ClassDraft::new("x", "2026-10-17", "9am", "10:00");
        assert_eq!(validate_class(&draft, now()), Err(CheckInError::InvalidFormat("startTime")));

        let draft = ClassDraft::new("x", "2026-10-17", "09:00", "25:00");
        assert_eq!(validate_class(&draft, now()), Err(CheckInError::InvalidFormat("endTime")));
    }

    #[test]
    fn test_valid_attendee_is_accepted() {
        let draft = AttendeeDraft::new(" Ada Lovelace ", " ADA@x.com ")
            .with_company("  ")
            .with_phone("(555) 123-4567")
            .with_future_interest(true);
        let details = validate_attendee(&draft).unwrap();

        assert_eq!(details.full_name, "Ada Lovelace");
        assert_eq!(details.email, "ADA@x.com");
        assert_eq!(details.company, None);
        assert_eq!(details.phone.as_deref(), Some("(555) 123-4567"));
        assert!(details.future_interest);
    }

    #[test]
    fn test_attendee_first_failure_wins() {
        let draft = AttendeeDraft::new("", "");
        assert_eq!(validate_attendee(&draft), Err(CheckInError::MissingField("fullName")));

        let draft = AttendeeDraft::new("n".repeat(101), "");
        assert_eq!(validate_attendee(&draft), Err(CheckInError::MissingField("email")));

        let draft = AttendeeDraft::new("n".repeat(101), "not-an-email").with_phone("12");
        assert_eq!(validate_attendee(&draft), Err(CheckInError::InvalidFormat("email")));

        let draft = AttendeeDraft::new("n".repeat(101), "a@b.co").with_phone("12");
        assert_eq!(validate_attendee(&draft), Err(CheckInError::InvalidFormat("phone")));

        let draft = AttendeeDraft::new("n".repeat(101), "a@b.co").with_company("c".repeat(101));
        assert_eq!(validate_attendee(&draft), Err(CheckInError::FieldTooLong("fullName")));

        let draft = AttendeeDraft::new("Ada", "a@b.co").with_company("c".repeat(101));
        assert_eq!(validate_attendee(&draft), Err(CheckInError::FieldTooLong("company")));
    }

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("ada@x.com"));
        assert!(is_valid_email("first.last+tag@mail.example.org"));
        assert!(!is_valid_email("ada@x"));
        assert!(!is_valid_email("ada x@y.com"));
        assert!(!is_valid_email("@x.com"));
    }

    #[test]
    fn test_phone_pattern() {
        assert!(is_valid_phone("5551234567"));
        assert!(is_valid_phone("+1 (555) 123-4567"));
        assert!(is_valid_phone("555-123-4567"));
        assert!(!is_valid_phone("555-1234"));
        assert!(!is_valid_phone("call me maybe"));
    }
}
