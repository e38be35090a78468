//! checkin - Class Check-In Library
//!
//! Tracks one active class session, its attendee check-ins and an archive of
//! past classes, with CSV export and a password-protected admin reset.

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
pub use application::*;
