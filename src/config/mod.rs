//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (MODE, NETWORK, PORT, RPCURL)
//!     → validation.rs (semantic checks)
//!     → resolved.rs Configuration (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod resolved;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use resolved::{Configuration, Mode};
pub use schema::{LogFormat, RosettaConfig};
pub use validation::ValidationError;
