//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! NETWORK setting
//!     → params.rs (chain id, forks, genesis, node arguments)
//!     → client.rs (JSON-RPC to the Findora node, per-call timeout)
//!     → node.rs (local node process when no remote RPC is configured)
//! ```
//!
//! # Constraints
//! - All RPC calls have configurable timeouts
//! - Node rejections are reported apart from transport failures

pub mod client;
pub mod node;
pub mod params;
pub mod types;

pub use client::{Client, NodeClient};
pub use node::{NodeError, NodeSupervisor};
pub use params::{ChainParams, Network, OperationType};
pub use types::{ChainId, ClientError, ClientResult};
