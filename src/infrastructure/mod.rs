//! Infrastructure layer providing external service integrations.
//!
//! This module contains the key-value backends, the state store built on
//! them and runtime configuration.

pub mod persistence;
pub mod store;
pub mod config;

pub use persistence::*;
pub use store::*;
pub use config::*;
