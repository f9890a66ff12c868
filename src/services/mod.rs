//! Read services outside the Construction flow.
//!
//! - network.rs: `/network/list` and `/network/options` from configuration
//! - mempool.rs: `/mempool` pass-through to the node, `/mempool/transaction`

pub mod mempool;
pub mod network;

pub use mempool::MempoolService;
pub use network::NetworkService;
