//! Attendee export as CSV.
//!
//! The export is a pure projection of a class session: one row per
//! attendee in check-in order, with the class details repeated on each row.

use super::errors::{CheckInError, CheckInResult};
use super::models::{Attendee, ClassSession};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use std::io::Write;

/// One CSV row. Field order is the column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "Class Name")]
    pub class_name: String,
    #[serde(rename = "Class Date")]
    pub class_date: String,
    #[serde(rename = "Class Time")]
    pub class_time: String,
    #[serde(rename = "Full Name")]
    pub full_name: String,
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Phone")]
    pub phone: String,
    #[serde(rename = "Future Interest")]
    pub future_interest: String,
    #[serde(rename = "Check-In Time")]
    pub check_in_time: String,
}

impl ExportRow {
    fn new(session: &ClassSession, attendee: &Attendee) -> Self {
        Self {
            class_name: session.name.clone(),
            class_date: format_date(session.date),
            class_time: format_time_range(session.start_time, session.end_time),
            full_name: attendee.full_name.clone(),
            company: attendee.company.clone().unwrap_or_default(),
            email: attendee.email.clone(),
            phone: attendee.phone.clone().unwrap_or_default(),
            future_interest: if attendee.future_interest { "Yes" } else { "No" }.to_string(),
            check_in_time: format_timestamp(attendee.check_in_time),
        }
    }
}

pub fn export_rows(session: &ClassSession) -> Vec<ExportRow> {
    session
        .attendees
        .iter()
        .map(|attendee| ExportRow::new(session, attendee))
        .collect()
}

/// Writes the header and one row per attendee to `writer`.
pub fn write_csv<W: Write>(session: &ClassSession, writer: W) -> CheckInResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in export_rows(session) {
        csv_writer
            .serialize(row)
            .map_err(|e| CheckInError::StorageFailure(format!("CSV write failed: {}", e)))?;
    }
    csv_writer
        .flush()
        .map_err(|e| CheckInError::StorageFailure(format!("CSV flush failed: {}", e)))
}

/// Renders the export into a string.
pub fn to_csv_string(session: &ClassSession) -> CheckInResult<String> {
    let mut buffer = Vec::new();
    write_csv(session, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| CheckInError::StorageFailure(e.to_string()))
}

/// `{sanitized name}_{YYYY-MM-DD}_attendees.csv`
pub fn export_filename(session: &ClassSession) -> String {
    format!(
        "{}_{}_attendees.csv",
        sanitize_filename(&session.name),
        session.date.format("%Y-%m-%d")
    )
}

/// Replaces every non-alphanumeric character with `_` and lowercases.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

/// `Friday, October 16, 2026`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// `6:00 PM`
pub fn format_time(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

/// `6:00 PM - 8:00 PM`
pub fn format_time_range(start: NaiveTime, end: NaiveTime) -> String {
    format!("{} - {}", format_time(start), format_time(end))
}

/// `Oct 16, 6:05 PM`, in local time.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%b %-d, %-I:%M %p").to_string()
}
