//! Local node process supervision.
//!
//! # Responsibilities
//! - Launch the Findora node binary with the network's arguments
//! - Re-emit its stdout/stderr line by line as tracing events
//! - Forward an interrupt on shutdown and wait for the process to exit
//!
//! # Data Flow
//! ```text
//! startup → NodeSupervisor::run
//!     → spawn binary (stdout/stderr piped)
//!     → log_pipe("findora") / log_pipe("findora err")
//!     → shutdown signal → kill -INT <pid> → wait
//! ```

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;

use crate::lifecycle::shutdown;
use crate::observability::metrics;

/// Errors from the supervised node process.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("unable to start findora ({binary}): {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("findora process wait failed: {0}")]
    Wait(#[source] std::io::Error),

    /// The node stopped without being asked to.
    #[error("findora exited unexpectedly with {0}")]
    Exited(ExitStatus),
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Owns the node child process for the lifetime of the server.
#[derive(Debug, Clone)]
pub struct NodeSupervisor {
    binary: PathBuf,
    arguments: Vec<String>,
    stop_timeout: Duration,
}

/// How long the node gets to exit after an interrupt before it is killed.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(30);

impl NodeSupervisor {
    /// `arguments` is split on whitespace; empty tokens are dropped.
    pub fn new(binary: impl AsRef<Path>, arguments: &str) -> Self {
        Self {
            binary: binary.as_ref().to_path_buf(),
            arguments: arguments.split_whitespace().map(str::to_string).collect(),
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }

    pub fn with_stop_timeout(mut self, stop_timeout: Duration) -> Self {
        self.stop_timeout = stop_timeout;
        self
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Run the node until it exits or `shutdown_rx` flips to `true`.
    ///
    /// Returns the exit status after a requested shutdown, and
    /// [`NodeError::Exited`] when the node stops on its own.
    pub async fn run(self, shutdown_rx: watch::Receiver<bool>) -> Result<ExitStatus, NodeError> {
        let mut child = Command::new(&self.binary)
            .args(&self.arguments)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| NodeError::Spawn {
                binary: self.binary.display().to_string(),
                source,
            })?;

        tracing::info!(
            binary = %self.binary.display(),
            pid = ?child.id(),
            args = ?self.arguments,
            "findora started"
        );
        metrics::record_node_up(true);

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(log_pipe(stdout, Stream::Stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(log_pipe(stderr, Stream::Stderr));
        }

        let result = tokio::select! {
            status = child.wait() => match status {
                Ok(status) => Err(NodeError::Exited(status)),
                Err(e) => Err(NodeError::Wait(e)),
            },
            _ = shutdown::wait(shutdown_rx) => {
                tracing::info!("sending interrupt to findora");
                interrupt(&mut child).await;
                match tokio::time::timeout(self.stop_timeout, child.wait()).await {
                    Ok(status) => status.map_err(NodeError::Wait),
                    Err(_) => {
                        tracing::warn!(
                            timeout_secs = self.stop_timeout.as_secs(),
                            "findora ignored interrupt, killing"
                        );
                        if let Err(e) = child.start_kill() {
                            tracing::error!(error = %e, "unable to kill findora");
                        }
                        child.wait().await.map_err(NodeError::Wait)
                    }
                }
            }
        };

        metrics::record_node_up(false);
        match &result {
            Ok(status) => tracing::info!(%status, "findora stopped"),
            Err(e) => tracing::error!(error = %e, "findora stopped"),
        }
        result
    }
}

/// Send SIGINT so the node can flush state; hard kill if that fails.
async fn interrupt(child: &mut Child) {
    let Some(pid) = child.id() else {
        return;
    };

    let sent = Command::new("kill")
        .arg("-INT")
        .arg(pid.to_string())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false);

    if !sent {
        tracing::warn!(pid, "interrupt failed, killing findora");
        if let Err(e) = child.start_kill() {
            tracing::error!(pid, error = %e, "unable to kill findora");
        }
    }
}

/// Logs keep flowing after shutdown starts, so this runs until EOF.
async fn log_pipe<R: AsyncRead + Unpin>(pipe: R, stream: Stream) {
    let mut lines = BufReader::new(pipe).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match stream {
                Stream::Stdout => tracing::info!(target: "findora", "{}", line),
                Stream::Stderr => tracing::info!(target: "findora err", "{}", line),
            },
            Ok(None) => {
                tracing::debug!(stream = ?stream, "closing findora pipe");
                return;
            }
            Err(e) => {
                tracing::warn!(stream = ?stream, error = %e, "closing findora pipe");
                return;
            }
        }
    }
}
