//! Startup orchestration.
//!
//! # Responsibilities
//! - Connect the node client in online mode
//! - Launch and supervise the local node unless a remote RPC URL is set
//! - Start the metrics exporter
//! - Bind the listener and serve until shutdown

use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::blockchain::{Client, ClientError, NodeClient, NodeError, NodeSupervisor};
use crate::config::Configuration;
use crate::http::{AppState, HttpServer};
use crate::lifecycle::{shutdown::Shutdown, signals};
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("unable to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to create node client: {0}")]
    Client(#[from] ClientError),

    #[error("invalid metrics address {0}")]
    MetricsAddress(String),

    #[error("unable to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("http server failed: {0}")]
    Serve(#[source] std::io::Error),

    #[error("findora node failed: {0}")]
    Node(#[from] NodeError),

    #[error("findora node task panicked: {0}")]
    NodeTask(#[from] tokio::task::JoinError),
}

/// Run the middleware until a termination signal or node failure.
pub async fn run(config: Configuration) -> Result<(), StartupError> {
    tracing::info!(
        mode = %config.mode,
        network = %config.network.network,
        chain_id = config.params.chain_id,
        rpc_url = %config.rpc_url,
        remote_rpc = config.remote_rpc,
        bind_address = %config.bind_address(),
        request_timeout_secs = config.request_timeout.as_secs(),
        "Configuration loaded"
    );

    let config = Arc::new(config);
    let shutdown = Arc::new(Shutdown::new());
    tokio::spawn(signals::listen(shutdown.clone()));

    if config.observability.metrics_enabled {
        let addr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let client: Option<Arc<dyn Client>> = if config.is_online() {
        let node_client = NodeClient::new(&config.rpc_url, config.rpc_timeout)?;
        tokio::spawn(check_chain_id(node_client.clone(), config.params.chain_id));
        Some(Arc::new(node_client))
    } else {
        None
    };

    // The node is stopped only after the HTTP server has drained.
    let node_stop = Shutdown::new();
    let node = if config.supervises_node() {
        let supervisor = NodeSupervisor::new(&config.node_binary, &config.node_arguments)
            .with_stop_timeout(config.node_stop_timeout);
        Some(spawn_node(supervisor, &node_stop, shutdown.clone()))
    } else {
        None
    };

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    let state = AppState::new(config.clone(), client, shutdown.subscribe());
    let served = HttpServer::new(state).run(listener).await;

    // Stop everything else even when the server failed.
    shutdown.trigger();
    node_stop.trigger();
    let node_result = match node {
        Some(handle) => handle.await?.map(|_| ()),
        None => Ok(()),
    };

    served.map_err(StartupError::Serve)?;
    node_result?;
    tracing::info!("findora-rosetta halted");
    Ok(())
}

/// Node failures bring the whole process down.
fn spawn_node(
    supervisor: NodeSupervisor,
    node_stop: &Shutdown,
    shutdown: Arc<Shutdown>,
) -> JoinHandle<Result<std::process::ExitStatus, NodeError>> {
    let stop_rx = node_stop.subscribe();
    tokio::spawn(async move {
        let result = supervisor.run(stop_rx).await;
        if result.is_err() {
            shutdown.trigger();
        }
        result
    })
}

async fn check_chain_id(client: NodeClient, expected: u64) {
    match client.verify_chain_id(expected).await {
        Ok(()) => tracing::debug!(chain_id = expected, "node chain id verified"),
        Err(ClientError::ChainMismatch { expected, actual }) => {
            tracing::error!(expected, actual, "node serves a different chain")
        }
        Err(e) => tracing::warn!(error = %e, "unable to verify node chain id"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::params::Network;
    use crate::config::Mode;

    #[tokio::test]
    async fn test_bind_failure_reported() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = Configuration::new(Mode::Offline, Network::Anvil);
        config.host = "127.0.0.1".to_string();
        config.port = taken.local_addr().unwrap().port();
        config.observability.metrics_enabled = false;

        let err = run(config).await.unwrap_err();
        assert!(matches!(err, StartupError::Bind { .. }));
    }

    #[tokio::test]
    async fn test_invalid_metrics_address() {
        let mut config = Configuration::new(Mode::Offline, Network::Anvil);
        config.observability.metrics_address = "nowhere".to_string();

        let err = run(config).await.unwrap_err();
        assert!(matches!(err, StartupError::MetricsAddress(_)));
    }
}
