//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::consensus::TxEnvelope;
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::{Address, B256};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use findora_rosetta::blockchain::params::Network;
use findora_rosetta::blockchain::{Client, ClientError, ClientResult};
use findora_rosetta::config::{Configuration, Mode};
use findora_rosetta::http::{AppState, HttpServer};
use findora_rosetta::lifecycle::Shutdown;
use findora_rosetta::rosetta::types::NetworkIdentifier;

pub const PUBLIC_KEY: &str = "03d3d3358e7f69cbe45bde38d7d6f24660c7eeeaee5c5590cfab985c8839b21fd5";
pub const SENDER: &str = "0xe3a5B4d7f79d64088C8d4ef153A7DDe2B2d47309";
pub const RECEIVER: &str = "0x57B414a0332B5CaB885a451c2a28a07d1e9b8a8d";
pub const VALUE: &str = "42894881044106498";
pub const UNSIGNED_RAW: &str = r#"{"from":"0xe3a5B4d7f79d64088C8d4ef153A7DDe2B2d47309","to":"0x57B414a0332B5CaB885a451c2a28a07d1e9b8a8d","value":"0x9864aac3510d02","data":"0x","nonce":"0x0","gas_price":"0x3b9aca00","gas":"0x5208","chain_id":"0x3"}"#;
pub const SIGNATURE: &str = "8c712c64bc65c4a88707fa93ecd090144dffb1bf133805a10a51d354c2f9f2b25a63cea6989f4c58372c41f31164036a6b25dce1d5c05e1d31c16c0590c176e801";
pub const PAYLOAD: &str = "b682f3e39c512ff57471f482eab264551487320cbd3b34485f4779a89e5612d1";
pub const SIGNED_RAW: &str = r#"{"type":"0x0","nonce":"0x0","gasPrice":"0x3b9aca00","maxPriorityFeePerGas":null,"maxFeePerGas":null,"gas":"0x5208","value":"0x9864aac3510d02","input":"0x","v":"0x2a","r":"0x8c712c64bc65c4a88707fa93ecd090144dffb1bf133805a10a51d354c2f9f2b2","s":"0x5a63cea6989f4c58372c41f31164036a6b25dce1d5c05e1d31c16c0590c176e8","to":"0x57b414a0332b5cab885a451c2a28a07d1e9b8a8d","hash":"0x424969b1a98757bcd748c60bad2a7de9745cfb26bfefb4550e780a098feada42"}"#;
pub const TX_HASH: &str = "0x424969b1a98757bcd748c60bad2a7de9745cfb26bfefb4550e780a098feada42";
pub const GAS_PRICE: u128 = 1_000_000_000;

/// Anvil with chain id 3, matching the reference signature.
pub fn config(mode: Mode) -> Arc<Configuration> {
    let mut config = Configuration::new(mode, Network::Anvil);
    config.params.chain_id = 3;
    config.request_timeout = Duration::from_secs(5);
    Arc::new(config)
}

pub fn network() -> NetworkIdentifier {
    NetworkIdentifier::new("Findora", "Anvil")
}

pub fn network_json() -> Value {
    json!({"blockchain": "Findora", "network": "Anvil"})
}

pub fn transfer_operations_json() -> Value {
    json!([
        {
            "operation_identifier": {"index": 0},
            "type": "CALL",
            "account": {"address": SENDER},
            "amount": {"value": format!("-{}", VALUE), "currency": {"symbol": "FRA", "decimals": 18}}
        },
        {
            "operation_identifier": {"index": 1},
            "related_operations": [{"index": 0}],
            "type": "CALL",
            "account": {"address": RECEIVER},
            "amount": {"value": VALUE, "currency": {"symbol": "FRA", "decimals": 18}}
        }
    ])
}

/// Scriptable [`Client`] that counts every call.
#[derive(Default)]
pub struct MockClient {
    pub gas_price: u128,
    pub nonce: u64,
    pub mempool: Vec<B256>,
    pub gas_price_delay: Duration,
    pub nonce_delay: Duration,
    pub fail_gas_price: bool,
    pub reject_submit: Option<String>,

    pub gas_price_calls: AtomicUsize,
    pub nonce_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub mempool_calls: AtomicUsize,
    pub nonce_finished: AtomicUsize,
    pub submitted: Mutex<Vec<Vec<u8>>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self {
            gas_price: GAS_PRICE,
            ..Self::default()
        }
    }

    pub fn total_calls(&self) -> usize {
        self.gas_price_calls.load(Ordering::SeqCst)
            + self.nonce_calls.load(Ordering::SeqCst)
            + self.submit_calls.load(Ordering::SeqCst)
            + self.mempool_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Client for MockClient {
    async fn suggest_gas_price(&self) -> ClientResult<u128> {
        self.gas_price_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.gas_price_delay).await;
        if self.fail_gas_price {
            return Err(ClientError::Rpc("gas price unavailable".into()));
        }
        Ok(self.gas_price)
    }

    async fn pending_nonce_at(&self, _address: Address) -> ClientResult<u64> {
        self.nonce_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.nonce_delay).await;
        self.nonce_finished.fetch_add(1, Ordering::SeqCst);
        Ok(self.nonce)
    }

    async fn send_transaction(&self, tx: &TxEnvelope) -> ClientResult<()> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.reject_submit {
            return Err(ClientError::Rejected(reason.clone()));
        }
        self.submitted
            .lock()
            .expect("submitted lock")
            .push(tx.encoded_2718());
        Ok(())
    }

    async fn get_mempool(&self) -> ClientResult<Vec<B256>> {
        self.mempool_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.mempool.clone())
    }
}

/// Serve the Rosetta API on an ephemeral local port.
pub async fn start_server(
    config: Arc<Configuration>,
    client: Option<Arc<dyn Client>>,
) -> (SocketAddr, Arc<Shutdown>) {
    let shutdown = Arc::new(Shutdown::new());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(AppState::new(config, client, shutdown.subscribe()));
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });

    (addr, shutdown)
}

/// Start a programmable JSON-RPC node. `f` maps `(method, params)` to
/// either a result or an `(code, message)` error.
pub async fn start_rpc_node<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, (i64, String)>> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let Some(body) = read_http_body(&mut socket).await else {
                            return;
                        };
                        let request: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
                        let method = request["method"].as_str().unwrap_or_default().to_string();
                        let params = request["params"].clone();
                        let reply = match f(method, params).await {
                            Ok(result) => json!({"jsonrpc": "2.0", "id": request["id"], "result": result}),
                            Err((code, message)) => json!({
                                "jsonrpc": "2.0",
                                "id": request["id"],
                                "error": {"code": code, "message": message}
                            }),
                        };
                        let reply = reply.to_string();
                        let response = format!(
                            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            reply.len(),
                            reply
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

async fn read_http_body(socket: &mut tokio::net::TcpStream) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
        let length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        let body_start = header_end + 4;
        if buf.len() >= body_start + length {
            return Some(buf[body_start..body_start + length].to_vec());
        }
    }
}
