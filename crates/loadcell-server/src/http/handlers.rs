use crate::AppState;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use loadcell_api::dto::{
    ComputeDto, EchoDto, EchoRequest, GreetingDto, InfoDto, ResetDto, SlowDto, StatsDto,
};
use loadcell_api::params::{
    parse_delay_ms, parse_iterations, validate_echo_message, validate_name,
};
use loadcell_api::ApiError;
use loadcell_core::{collect_runtime_info, format_iso8601};
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

pub(crate) fn api_error_response(status: StatusCode, err: ApiError) -> Response {
    (status, Json(err)).into_response()
}

pub(crate) fn make_request_id(state: &AppState) -> String {
    let id = state.request_id_seed.fetch_add(1, Ordering::Relaxed);
    format!("req-{id:016x}")
}

pub(crate) fn propagated_request_id(headers: &HeaderMap, state: &AppState) -> String {
    if let Some(raw) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    make_request_id(state)
}

pub(crate) fn with_request_id(mut response: Response, request_id: &str) -> Response {
    if let Ok(v) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert("x-request-id", v);
    }
    response
}

fn is_draining(state: &AppState) -> bool {
    !state.accepting_requests.load(Ordering::Relaxed)
}

pub(crate) async fn healthz_handler(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let request_id = make_request_id(&state);
    let resp = (StatusCode::OK, "ok").into_response();
    state
        .metrics
        .observe_request("/healthz", StatusCode::OK, started.elapsed())
        .await;
    with_request_id(resp, &request_id)
}

pub(crate) async fn readyz_handler(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let request_id = make_request_id(&state);
    let (status, body) = if state.ready.load(Ordering::Relaxed) {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not-ready")
    };
    let resp = (status, body).into_response();
    state
        .metrics
        .observe_request("/readyz", status, started.elapsed())
        .await;
    with_request_id(resp, &request_id)
}

pub(crate) async fn metrics_handler(State(state): State<AppState>) -> Response {
    crate::telemetry::metrics_endpoint::metrics_handler(State(state)).await
}

pub(crate) async fn hello_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let outcome = state.workload.greet();
    let resp = Json(GreetingDto {
        message: outcome.message,
        timestamp: outcome.timestamp,
    })
    .into_response();
    state
        .metrics
        .observe_request("/api/hello", StatusCode::OK, started.elapsed())
        .await;
    with_request_id(resp, &request_id)
}

pub(crate) async fn hello_name_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    if let Err(err) = validate_name(&name, state.api.max_name_chars) {
        state.metrics.rejected_total.fetch_add(1, Ordering::Relaxed);
        let resp = api_error_response(StatusCode::BAD_REQUEST, err);
        state
            .metrics
            .observe_request("/api/hello/{name}", StatusCode::BAD_REQUEST, started.elapsed())
            .await;
        return with_request_id(resp, &request_id);
    }
    let outcome = state.workload.greet_name(&name);
    let resp = Json(GreetingDto {
        message: outcome.message,
        timestamp: outcome.timestamp,
    })
    .into_response();
    state
        .metrics
        .observe_request("/api/hello/{name}", StatusCode::OK, started.elapsed())
        .await;
    with_request_id(resp, &request_id)
}

pub(crate) async fn echo_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);

    // An absent body is distinct from a present-but-invalid message:
    // the former never reaches the operation and never counts.
    if body.is_empty() || body.as_ref() == b"null" {
        let resp = api_error_response(StatusCode::BAD_REQUEST, ApiError::missing_body());
        state
            .metrics
            .observe_request("/api/echo", StatusCode::BAD_REQUEST, started.elapsed())
            .await;
        return with_request_id(resp, &request_id);
    }

    let request: EchoRequest = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            state.metrics.rejected_total.fetch_add(1, Ordering::Relaxed);
            let resp =
                api_error_response(StatusCode::BAD_REQUEST, ApiError::invalid_body(&e.to_string()));
            state
                .metrics
                .observe_request("/api/echo", StatusCode::BAD_REQUEST, started.elapsed())
                .await;
            return with_request_id(resp, &request_id);
        }
    };
    if let Err(err) = validate_echo_message(&request.message, state.api.max_message_chars) {
        state.metrics.rejected_total.fetch_add(1, Ordering::Relaxed);
        let resp = api_error_response(StatusCode::BAD_REQUEST, err);
        state
            .metrics
            .observe_request("/api/echo", StatusCode::BAD_REQUEST, started.elapsed())
            .await;
        return with_request_id(resp, &request_id);
    }

    let outcome = state.workload.echo(&request.message);
    let resp = Json(EchoDto {
        echo: outcome.echo,
        length: outcome.length as u64,
        timestamp: outcome.timestamp,
    })
    .into_response();
    state
        .metrics
        .observe_request("/api/echo", StatusCode::OK, started.elapsed())
        .await;
    with_request_id(resp, &request_id)
}

pub(crate) async fn slow_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    if is_draining(&state) {
        let resp = api_error_response(StatusCode::SERVICE_UNAVAILABLE, ApiError::draining());
        state
            .metrics
            .observe_request("/api/slow", StatusCode::SERVICE_UNAVAILABLE, started.elapsed())
            .await;
        return with_request_id(resp, &request_id);
    }
    let delay_ms = match parse_delay_ms(&params, state.api.default_delay_ms, state.api.max_delay_ms)
    {
        Ok(v) => v,
        Err(err) => {
            state.metrics.rejected_total.fetch_add(1, Ordering::Relaxed);
            let resp = api_error_response(StatusCode::BAD_REQUEST, err);
            state
                .metrics
                .observe_request("/api/slow", StatusCode::BAD_REQUEST, started.elapsed())
                .await;
            return with_request_id(resp, &request_id);
        }
    };

    let cancel = state.shutdown.child_token();
    match state
        .workload
        .slow(Duration::from_millis(delay_ms), &cancel)
        .await
    {
        Ok(outcome) => {
            let resp = Json(SlowDto {
                message: outcome.message,
                delay_ms,
                timestamp: outcome.timestamp,
            })
            .into_response();
            state
                .metrics
                .observe_request("/api/slow", StatusCode::OK, started.elapsed())
                .await;
            with_request_id(resp, &request_id)
        }
        Err(_) => {
            state
                .metrics
                .interrupted_total
                .fetch_add(1, Ordering::Relaxed);
            info!(request_id = %request_id, delay_ms, "slow wait interrupted");
            let resp =
                api_error_response(StatusCode::SERVICE_UNAVAILABLE, ApiError::interrupted());
            state
                .metrics
                .observe_request("/api/slow", StatusCode::SERVICE_UNAVAILABLE, started.elapsed())
                .await;
            with_request_id(resp, &request_id)
        }
    }
}

pub(crate) async fn compute_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    if is_draining(&state) {
        let resp = api_error_response(StatusCode::SERVICE_UNAVAILABLE, ApiError::draining());
        state
            .metrics
            .observe_request(
                "/api/compute",
                StatusCode::SERVICE_UNAVAILABLE,
                started.elapsed(),
            )
            .await;
        return with_request_id(resp, &request_id);
    }
    let iterations = match parse_iterations(
        &params,
        state.api.default_iterations,
        state.api.max_iterations,
    ) {
        Ok(v) => v,
        Err(err) => {
            state.metrics.rejected_total.fetch_add(1, Ordering::Relaxed);
            let resp = api_error_response(StatusCode::BAD_REQUEST, err);
            state
                .metrics
                .observe_request("/api/compute", StatusCode::BAD_REQUEST, started.elapsed())
                .await;
            return with_request_id(resp, &request_id);
        }
    };

    // The kernel pegs a core for up to hundreds of milliseconds; keep
    // it off the async workers.
    let workload = Arc::clone(&state.workload);
    let outcome = match tokio::task::spawn_blocking(move || workload.compute(iterations)).await {
        Ok(v) => v,
        Err(e) => {
            let resp = api_error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::with_details(
                    "compute task failed",
                    serde_json::json!({"message": e.to_string()}),
                ),
            );
            state
                .metrics
                .observe_request(
                    "/api/compute",
                    StatusCode::INTERNAL_SERVER_ERROR,
                    started.elapsed(),
                )
                .await;
            return with_request_id(resp, &request_id);
        }
    };
    let resp = Json(ComputeDto {
        message: outcome.message,
        iterations: outcome.iterations,
        result: outcome.result,
        duration_ms: outcome.duration.as_millis() as u64,
        timestamp: outcome.timestamp,
    })
    .into_response();
    state
        .metrics
        .observe_request("/api/compute", StatusCode::OK, started.elapsed())
        .await;
    with_request_id(resp, &request_id)
}

pub(crate) async fn stats_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let snapshot = state.workload.stats();
    let resp = Json(StatsDto {
        total_requests: snapshot.total_requests,
        app_uptime: format_iso8601(snapshot.uptime),
        start_time: snapshot.started_at,
        current_time: snapshot.current_time,
    })
    .into_response();
    state
        .metrics
        .observe_request("/api/stats", StatusCode::OK, started.elapsed())
        .await;
    with_request_id(resp, &request_id)
}

pub(crate) async fn reset_stats_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    // The admin key is accepted but not enforced; there is no real
    // authorization on reset.
    let key_present = headers
        .get("x-admin-key")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| !v.trim().is_empty());
    debug!(request_id = %request_id, key_present, "stats reset requested");
    let previous = state.workload.reset();
    info!(request_id = %request_id, previous, "request counter reset");
    let resp = Json(ResetDto {
        message: "Statistics reset".to_string(),
        previous_request_count: previous,
    })
    .into_response();
    state
        .metrics
        .observe_request("/api/stats/reset", StatusCode::OK, started.elapsed())
        .await;
    with_request_id(resp, &request_id)
}

pub(crate) async fn info_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    if !state.api.enable_runtime_info {
        let resp = api_error_response(StatusCode::NOT_FOUND, ApiError::endpoint_disabled());
        state
            .metrics
            .observe_request("/api/info", StatusCode::NOT_FOUND, started.elapsed())
            .await;
        return with_request_id(resp, &request_id);
    }
    let info = collect_runtime_info(state.workload.counter());
    let resp = Json(InfoDto {
        hostname: info.hostname,
        service_version: info.service_version,
        runtime_version: info.runtime_version,
        runtime_vendor: info.runtime_vendor,
        os_name: info.os_name,
        os_arch: info.os_arch,
        available_processors: info.available_processors as u64,
        memory_used_bytes: info.memory_used_bytes,
        memory_total_bytes: info.memory_total_bytes,
        uptime: info.uptime,
        request_count: info.request_count,
        app_uptime: info.app_uptime,
    })
    .into_response();
    state
        .metrics
        .observe_request("/api/info", StatusCode::OK, started.elapsed())
        .await;
    with_request_id(resp, &request_id)
}
