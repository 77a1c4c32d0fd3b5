use std::time::Instant;

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

/// Per-request counters and latency, labelled by the matched route template
/// rather than the raw path so ids don't explode cardinality.
pub async fn metrics_middleware(matched_path: Option<MatchedPath>, req: Request<Body>, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().to_string();
    let route = match matched_path {
        Some(p) => p.as_str().to_owned(),
        None => "unmatched".to_owned(),
    };

    gauge!("http_requests_in_flight").increment(1.0);
    let response = next.run(req).await;
    gauge!("http_requests_in_flight").decrement(1.0);

    let labels = [
        ("method", method),
        ("route", route),
        ("status", response.status().as_u16().to_string()),
    ];
    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(started.elapsed().as_secs_f64());

    response
}

/// Installs the global Prometheus recorder. Every series carries a `service`
/// label; `*_duration_seconds` metrics are exported as histograms.
pub fn init_metrics(service_name: &str) -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .add_global_label("service", service_name)
        .set_buckets_for_metric(Matcher::Suffix("duration_seconds".into()), LATENCY_BUCKETS)?
        .install_recorder()?;

    tracing::info!(service = service_name, "prometheus recorder installed");
    Ok(handle)
}
