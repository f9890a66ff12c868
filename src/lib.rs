//! Findora Rosetta Construction middleware library.

pub mod blockchain;
pub mod config;
pub mod construction;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rosetta;
pub mod services;

pub use config::{load_config, Configuration, Mode};
pub use construction::{ConstructionError, ConstructionService, Context};
pub use http::{AppState, HttpServer};
pub use lifecycle::Shutdown;
