//! Rosetta API data model shared by every endpoint.

pub mod types;

pub use types::{NetworkIdentifier, Object};
