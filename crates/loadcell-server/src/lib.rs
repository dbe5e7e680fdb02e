#![forbid(unsafe_code)]

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use loadcell_core::Workload;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

mod config;
mod http;
mod middleware;
mod telemetry;

pub use config::{validate_startup_config_contract, ApiConfig};

pub const CRATE_NAME: &str = "loadcell-server";

#[derive(Default)]
pub(crate) struct RequestMetrics {
    counts: Mutex<HashMap<(String, u16), u64>>,
    latency_ns: Mutex<HashMap<String, Vec<u64>>>,
    interrupted_total: AtomicU64,
    rejected_total: AtomicU64,
}

impl RequestMetrics {
    pub(crate) async fn observe_request(&self, route: &str, status: StatusCode, latency: Duration) {
        let mut counts = self.counts.lock().await;
        *counts
            .entry((route.to_string(), status.as_u16()))
            .or_insert(0) += 1;
        drop(counts);
        let mut latency_map = self.latency_ns.lock().await;
        latency_map
            .entry(route.to_string())
            .or_insert_with(Vec::new)
            .push(latency.as_nanos() as u64);
    }
}

#[derive(Clone)]
pub struct AppState {
    pub workload: Arc<Workload>,
    pub api: ApiConfig,
    pub ready: Arc<AtomicBool>,
    pub accepting_requests: Arc<AtomicBool>,
    /// Cancelled when the server starts draining; in-flight slow waits
    /// observe it through per-request child tokens.
    pub shutdown: CancellationToken,
    pub(crate) metrics: Arc<RequestMetrics>,
    pub(crate) request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(workload: Arc<Workload>) -> Self {
        Self::with_config(workload, ApiConfig::default())
    }

    #[must_use]
    pub fn with_config(workload: Arc<Workload>, api: ApiConfig) -> Self {
        Self {
            workload,
            api,
            ready: Arc::new(AtomicBool::new(true)),
            accepting_requests: Arc::new(AtomicBool::new(true)),
            shutdown: CancellationToken::new(),
            metrics: Arc::new(RequestMetrics::default()),
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Flips readiness off, stops admitting workload requests, and
    /// interrupts in-flight slow waits.
    pub fn begin_shutdown_drain(&self) {
        self.accepting_requests.store(false, Ordering::Relaxed);
        self.ready.store(false, Ordering::Relaxed);
        self.shutdown.cancel();
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(http::handlers::healthz_handler))
        .route("/readyz", get(http::handlers::readyz_handler))
        .route("/metrics", get(http::handlers::metrics_handler))
        .route("/api/hello", get(http::handlers::hello_handler))
        .route("/api/hello/:name", get(http::handlers::hello_name_handler))
        .route("/api/echo", post(http::handlers::echo_handler))
        .route("/api/slow", get(http::handlers::slow_handler))
        .route("/api/compute", get(http::handlers::compute_handler))
        .route("/api/stats", get(http::handlers::stats_handler))
        .route("/api/stats/reset", post(http::handlers::reset_stats_handler))
        .route("/api/info", get(http::handlers::info_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::request_tracing::request_tracing_middleware,
        ))
        .layer(DefaultBodyLimit::max(state.api.max_body_bytes))
        .with_state(state)
}
