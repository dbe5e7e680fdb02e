#![forbid(unsafe_code)]

use loadcell_core::Workload;
use loadcell_server::{
    build_router, validate_startup_config_contract, ApiConfig, AppState, CRATE_NAME,
};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool("LOADCELL_LOG_JSON", true) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();

    let bind_addr = env::var("LOADCELL_BIND").unwrap_or_else(|_| "0.0.0.0:9080".to_string());
    let api_cfg = ApiConfig {
        max_body_bytes: env_usize("LOADCELL_MAX_BODY_BYTES", 64 * 1024),
        default_delay_ms: env_u64("LOADCELL_DEFAULT_DELAY_MS", 1000),
        max_delay_ms: env_u64("LOADCELL_MAX_DELAY_MS", 10_000),
        default_iterations: env_u64("LOADCELL_DEFAULT_ITERATIONS", 1_000_000),
        max_iterations: env_u64("LOADCELL_MAX_ITERATIONS", 10_000_000),
        max_name_chars: env_usize("LOADCELL_MAX_NAME_CHARS", 100),
        max_message_chars: env_usize("LOADCELL_MAX_MESSAGE_CHARS", 10_000),
        enable_runtime_info: env_bool("LOADCELL_ENABLE_RUNTIME_INFO", false),
        shutdown_drain: Duration::from_millis(env_u64("LOADCELL_SHUTDOWN_DRAIN_MS", 5000)),
    };
    validate_startup_config_contract(&api_cfg)?;

    let state = AppState::with_config(Arc::new(Workload::new()), api_cfg);
    let app = build_router(state.clone());

    let addr: std::net::SocketAddr = bind_addr
        .parse()
        .map_err(|e| format!("invalid bind addr {bind_addr}: {e}"))?;
    let socket = if addr.is_ipv4() {
        tokio::net::TcpSocket::new_v4().map_err(|e| format!("socket v4 failed: {e}"))?
    } else {
        tokio::net::TcpSocket::new_v6().map_err(|e| format!("socket v6 failed: {e}"))?
    };
    socket
        .set_reuseaddr(true)
        .map_err(|e| format!("set_reuseaddr failed: {e}"))?;
    socket
        .set_keepalive(env_bool("LOADCELL_TCP_KEEPALIVE_ENABLED", true))
        .map_err(|e| format!("set_keepalive failed: {e}"))?;
    socket.bind(addr).map_err(|e| format!("bind failed: {e}"))?;
    let listener: TcpListener = socket
        .listen(1024)
        .map_err(|e| format!("listen failed: {e}"))?;
    info!("{CRATE_NAME} listening on {bind_addr}");

    let drain = state.api.shutdown_drain;
    let state_for_shutdown = state.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_shutdown_signal().await;
            // Stop admitting workload requests and interrupt in-flight
            // slow waits, then drain what remains.
            state_for_shutdown.begin_shutdown_drain();
            tokio::time::sleep(drain).await;
        })
        .await
        .map_err(|e| format!("server failed: {e}"))
}
