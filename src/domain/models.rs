use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Wire format for class start and end times.
pub const TIME_FORMAT: &str = "%H:%M";
/// Wire format for class dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A scheduled class that attendees check into.
///
/// At most one session is active at a time; it lives in the store's single
/// active slot. Archived sessions carry `archived_at` and sit in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSession {
    pub id: String,
    pub name: String,
    pub date: NaiveDate,
    #[serde(serialize_with = "serialize_time", deserialize_with = "deserialize_time")]
    pub start_time: NaiveTime,
    #[serde(serialize_with = "serialize_time", deserialize_with = "deserialize_time")]
    pub end_time: NaiveTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Check-in order.
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
}

impl ClassSession {
    /// Builds a fresh, empty session from an accepted schedule.
    pub fn new(id: String, schedule: ClassSchedule, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: schedule.name,
            date: schedule.date,
            start_time: schedule.start_time,
            end_time: schedule.end_time,
            description: schedule.description,
            attendees: Vec::new(),
            created_at,
            last_modified: None,
            archived_at: None,
        }
    }

    /// Case-insensitive lookup used for the duplicate-registration check.
    pub fn has_attendee_email(&self, email: &str) -> bool {
        let needle = email.to_lowercase();
        self.attendees
            .iter()
            .any(|attendee| attendee.email.to_lowercase() == needle)
    }

    pub fn add_attendee(&mut self, attendee: Attendee, at: DateTime<Utc>) {
        self.attendees.push(attendee);
        self.last_modified = Some(at);
    }

    pub fn attendee_count(&self) -> usize {
        self.attendees.len()
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// Whether `now` (local wall-clock time) falls on the class date and
    /// inside its time window, bounds included.
    pub fn is_in_progress(&self, now: NaiveDateTime) -> bool {
        now.date() == self.date && now.time() >= self.start_time && now.time() <= self.end_time
    }
}

/// A registered attendee of a class session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub id: String,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// Stored with the casing the attendee typed.
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub future_interest: bool,
    pub check_in_time: DateTime<Utc>,
}

impl Attendee {
    pub fn new(id: String, details: AttendeeDetails, check_in_time: DateTime<Utc>) -> Self {
        Self {
            id,
            full_name: details.full_name,
            company: details.company,
            email: details.email,
            phone: details.phone,
            future_interest: details.future_interest,
            check_in_time,
        }
    }
}

/// Raw class form input, before trimming and validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassDraft {
    pub name: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub description: String,
}

impl ClassDraft {
    pub fn new(
        name: impl Into<String>,
        date: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            date: date.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Form defaults: today, starting at the next whole hour and lasting one
    /// hour. Near midnight the times wrap and the user has to adjust them.
    pub fn suggested(now: NaiveDateTime) -> Self {
        let hour = NaiveTime::from_hms_opt(now.hour(), 0, 0).unwrap_or(NaiveTime::MIN);
        let start = hour + TimeDelta::hours(1);
        let end = start + TimeDelta::hours(1);
        Self::new(
            String::new(),
            now.date().format(DATE_FORMAT).to_string(),
            start.format(TIME_FORMAT).to_string(),
            end.format(TIME_FORMAT).to_string(),
        )
    }
}

/// Raw check-in form input, before trimming and validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendeeDraft {
    pub full_name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub future_interest: bool,
}

impl AttendeeDraft {
    pub fn new(full_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            email: email.into(),
            ..Self::default()
        }
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = company.into();
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn with_future_interest(mut self, interested: bool) -> Self {
        self.future_interest = interested;
        self
    }
}

/// A class draft that passed validation: trimmed and parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassSchedule {
    pub name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub description: Option<String>,
}

/// An attendee draft that passed validation: trimmed, empty optionals dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendeeDetails {
    pub full_name: String,
    pub company: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub future_interest: bool,
}

fn serialize_time<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&time.format(TIME_FORMAT).to_string())
}

fn deserialize_time<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    NaiveTime::parse_from_str(&raw, TIME_FORMAT).map_err(serde::de::Error::custom)
}
