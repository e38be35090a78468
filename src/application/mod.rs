//! Application layer managing state and business workflows.
//!
//! This module coordinates between the domain layer and presentation layer:
//! the session workflows run against the state store, and the TUI state
//! turns user intents into workflow calls.

pub mod workflows;
pub mod form;
pub mod state;

pub use workflows::*;
pub use form::*;
pub use state::*;
