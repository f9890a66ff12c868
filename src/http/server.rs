//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with every Rosetta endpoint
//! - Wire up middleware (tracing, limits, request ID, timeout, CORS)
//! - Build a per-request context from the request timeout and shutdown signal
//! - Serve until shutdown, then drain in-flight requests

use axum::{
    extract::{rejection::JsonRejection, MatchedPath, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::blockchain::Client;
use crate::config::Configuration;
use crate::construction::{ConstructionError, ConstructionService, Context};
use crate::http::request::{request_span, MakeRequestUuid};
use crate::http::response::ApiResult;
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::rosetta::types::*;
use crate::services::{MempoolService, NetworkService};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub construction: ConstructionService,
    pub network: NetworkService,
    pub mempool: MempoolService,
    pub config: Arc<Configuration>,
    pub shutdown: watch::Receiver<bool>,
}

impl AppState {
    pub fn new(
        config: Arc<Configuration>,
        client: Option<Arc<dyn Client>>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            construction: ConstructionService::new(config.clone(), client.clone()),
            network: NetworkService::new(config.clone()),
            mempool: MempoolService::new(config.clone(), client),
            config,
            shutdown,
        }
    }

    /// Bounded by the request timeout, cancelled on shutdown.
    fn context(&self) -> Context {
        Context::background()
            .with_timeout(self.config.request_timeout)
            .with_cancel(self.shutdown.clone())
    }
}

/// HTTP server for the Rosetta API.
pub struct HttpServer {
    router: Router,
    shutdown: watch::Receiver<bool>,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        let shutdown = state.shutdown.clone();
        let router = Self::build_router(state);
        Self { router, shutdown }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(state: AppState) -> Router {
        let request_timeout = state.config.request_timeout;
        let max_body_bytes = state.config.max_body_bytes;

        Router::new()
            .route("/network/list", post(network_list))
            .route("/network/options", post(network_options))
            .route("/mempool", post(mempool))
            .route("/mempool/transaction", post(mempool_transaction))
            .route("/construction/derive", post(construction_derive))
            .route("/construction/preprocess", post(construction_preprocess))
            .route("/construction/metadata", post(construction_metadata))
            .route("/construction/payloads", post(construction_payloads))
            .route("/construction/combine", post(construction_combine))
            .route("/construction/parse", post(construction_parse))
            .route("/construction/hash", post(construction_hash))
            .route("/construction/submit", post(construction_submit))
            .route("/health", get(health))
            .route_layer(middleware::from_fn(track_metrics))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(request_span::<axum::body::Body>))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(RequestBodyLimitLayer::new(max_body_bytes))
                    .layer(CorsLayer::permissive())
                    .layer(TimeoutLayer::new(request_timeout + Duration::from_secs(1))),
            )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(self.shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn track_metrics(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;
    metrics::record_request(&endpoint, response.status().as_u16(), start);
    response
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "mode": state.config.mode.as_str(),
        "network": state.config.network.network,
    }))
}

async fn network_list(
    State(state): State<AppState>,
    payload: Result<Json<MetadataRequest>, JsonRejection>,
) -> ApiResult<NetworkListResponse> {
    let Json(request) = payload?;
    Ok(Json(state.network.list(&request)))
}

async fn network_options(
    State(state): State<AppState>,
    payload: Result<Json<NetworkRequest>, JsonRejection>,
) -> ApiResult<NetworkOptionsResponse> {
    let Json(request) = payload?;
    Ok(Json(state.network.options(&request)?))
}

async fn mempool(
    State(state): State<AppState>,
    payload: Result<Json<NetworkRequest>, JsonRejection>,
) -> ApiResult<MempoolResponse> {
    let Json(request) = payload?;
    let ctx = state.context();
    Ok(Json(state.mempool.mempool(&ctx, &request).await?))
}

async fn mempool_transaction(
    State(state): State<AppState>,
    payload: Result<Json<MempoolTransactionRequest>, JsonRejection>,
) -> Result<Json<Value>, ConstructionError> {
    let Json(request) = payload?;
    let ctx = state.context();
    state.mempool.mempool_transaction(&ctx, &request).await?;
    Err(ConstructionError::Unimplemented)
}

async fn construction_derive(
    State(state): State<AppState>,
    payload: Result<Json<ConstructionDeriveRequest>, JsonRejection>,
) -> ApiResult<ConstructionDeriveResponse> {
    let Json(request) = payload?;
    Ok(Json(state.construction.derive(&request)?))
}

async fn construction_preprocess(
    State(state): State<AppState>,
    payload: Result<Json<ConstructionPreprocessRequest>, JsonRejection>,
) -> ApiResult<ConstructionPreprocessResponse> {
    let Json(request) = payload?;
    Ok(Json(state.construction.preprocess(&request)?))
}

async fn construction_metadata(
    State(state): State<AppState>,
    payload: Result<Json<ConstructionMetadataRequest>, JsonRejection>,
) -> ApiResult<ConstructionMetadataResponse> {
    let Json(request) = payload?;
    let ctx = state.context();
    Ok(Json(state.construction.metadata(&ctx, &request).await?))
}

async fn construction_payloads(
    State(state): State<AppState>,
    payload: Result<Json<ConstructionPayloadsRequest>, JsonRejection>,
) -> ApiResult<ConstructionPayloadsResponse> {
    let Json(request) = payload?;
    Ok(Json(state.construction.payloads(&request)?))
}

async fn construction_combine(
    State(state): State<AppState>,
    payload: Result<Json<ConstructionCombineRequest>, JsonRejection>,
) -> ApiResult<ConstructionCombineResponse> {
    let Json(request) = payload?;
    Ok(Json(state.construction.combine(&request)?))
}

async fn construction_parse(
    State(state): State<AppState>,
    payload: Result<Json<ConstructionParseRequest>, JsonRejection>,
) -> ApiResult<ConstructionParseResponse> {
    let Json(request) = payload?;
    Ok(Json(state.construction.parse(&request)?))
}

async fn construction_hash(
    State(state): State<AppState>,
    payload: Result<Json<ConstructionHashRequest>, JsonRejection>,
) -> ApiResult<TransactionIdentifierResponse> {
    let Json(request) = payload?;
    Ok(Json(state.construction.hash(&request)?))
}

async fn construction_submit(
    State(state): State<AppState>,
    payload: Result<Json<ConstructionSubmitRequest>, JsonRejection>,
) -> ApiResult<TransactionIdentifierResponse> {
    let Json(request) = payload?;
    let ctx = state.context();
    Ok(Json(state.construction.submit(&ctx, &request).await?))
}
