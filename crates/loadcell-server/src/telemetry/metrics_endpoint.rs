use crate::AppState;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::time::Instant;

const METRIC_SUBSYSTEM: &str = "loadcell";
const METRIC_VERSION: &str = env!("CARGO_PKG_VERSION");

fn percentile_ns(values: &[u64], pct: f64) -> u64 {
    if values.is_empty() {
        return 0;
    }
    let mut v = values.to_vec();
    v.sort_unstable();
    let idx = ((v.len() as f64 - 1.0) * pct).round() as usize;
    v[idx]
}

pub(crate) async fn metrics_handler(State(state): State<AppState>) -> Response {
    let request_id = crate::http::handlers::make_request_id(&state);
    let started = Instant::now();
    let counter = state.workload.counter();

    let mut body = format!(
        "loadcell_build_info{{subsystem=\"{sub}\",version=\"{ver}\",config_schema=\"{schema}\"}} 1\n\
loadcell_workload_requests_total{{subsystem=\"{sub}\",version=\"{ver}\"}} {}\n\
loadcell_uptime_seconds{{subsystem=\"{sub}\",version=\"{ver}\"}} {}\n\
loadcell_slow_interrupted_total{{subsystem=\"{sub}\",version=\"{ver}\"}} {}\n\
loadcell_validation_rejected_total{{subsystem=\"{sub}\",version=\"{ver}\"}} {}\n",
        counter.total(),
        counter.uptime().as_secs(),
        state.metrics.interrupted_total.load(Ordering::Relaxed),
        state.metrics.rejected_total.load(Ordering::Relaxed),
        sub = METRIC_SUBSYSTEM,
        ver = METRIC_VERSION,
        schema = crate::config::CONFIG_SCHEMA_VERSION,
    );

    let counts: BTreeMap<(String, u16), u64> = state
        .metrics
        .counts
        .lock()
        .await
        .iter()
        .map(|(k, v)| (k.clone(), *v))
        .collect();
    for ((route, status), count) in &counts {
        body.push_str(&format!(
            "loadcell_http_requests_total{{route=\"{route}\",status=\"{status}\"}} {count}\n"
        ));
    }

    let latency: BTreeMap<String, Vec<u64>> = state
        .metrics
        .latency_ns
        .lock()
        .await
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    for (route, values) in &latency {
        for (tag, pct) in [("p50", 0.5), ("p95", 0.95), ("p99", 0.99)] {
            body.push_str(&format!(
                "loadcell_request_latency_{tag}_seconds{{route=\"{route}\"}} {:.6}\n",
                percentile_ns(values, pct) as f64 / 1e9
            ));
        }
    }

    let mut resp = (StatusCode::OK, body).into_response();
    resp.headers_mut().insert(
        "content-type",
        HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    state
        .metrics
        .observe_request("/metrics", StatusCode::OK, started.elapsed())
        .await;
    crate::http::handlers::with_request_id(resp, &request_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_of_empty_sample_is_zero() {
        assert_eq!(percentile_ns(&[], 0.95), 0);
    }

    #[test]
    fn percentile_picks_from_the_sorted_tail() {
        let values: Vec<u64> = (1..=100).collect();
        assert_eq!(percentile_ns(&values, 0.5), 51);
        assert_eq!(percentile_ns(&values, 0.95), 95);
        assert_eq!(percentile_ns(&values, 0.99), 99);
    }
}
