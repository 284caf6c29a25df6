//! Prometheus metrics for the txt2kg CLI.
//!
//! Exposes:
//! - `txt2kg_command_duration_seconds` (histogram)
//! - `txt2kg_command_total` (counter with status)
//! - `txt2kg_command_inflight` (gauge)
//! - `txt2kg_llm_requests_total` (counter by backend and status)
//! - `txt2kg_triples_accepted_total` / `txt2kg_lines_discarded_total` (counters)
//! - process metrics via `process` collector

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use once_cell::sync::Lazy;
use prometheus::process_collector::ProcessCollector;
use prometheus::{
    default_registry, register_histogram_vec, register_int_counter, register_int_counter_vec,
    register_int_gauge_vec, Encoder, HistogramVec, IntCounter, IntCounterVec, IntGaugeVec,
    TextEncoder,
};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

static PROCESS_COLLECTOR: Lazy<()> = Lazy::new(|| {
    if let Err(err) = default_registry().register(Box::new(ProcessCollector::for_self())) {
        warn!("Failed to register process collector: {}", err);
    }
});

static COMMAND_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    // 250ms up to ~34 minutes; whole-corpus extractions are slow.
    let buckets =
        prometheus::exponential_buckets(0.25, 2.0, 14).expect("failed to create histogram buckets");
    register_histogram_vec!(
        "txt2kg_command_duration_seconds",
        "CLI command duration in seconds",
        &["command"],
        buckets
    )
    .expect("failed to register command duration histogram")
});

static COMMAND_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "txt2kg_command_total",
        "Total command executions by status",
        &["command", "status"]
    )
    .expect("failed to register command counter")
});

static COMMAND_INFLIGHT: Lazy<IntGaugeVec> = Lazy::new(|| {
    register_int_gauge_vec!(
        "txt2kg_command_inflight",
        "Number of in-flight commands",
        &["command"]
    )
    .expect("failed to register inflight gauge")
});

static LLM_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "txt2kg_llm_requests_total",
        "LLM completions by backend and status",
        &["backend", "status"]
    )
    .expect("failed to register llm request counter")
});

static TRIPLES_ACCEPTED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "txt2kg_triples_accepted_total",
        "Triples parsed from LLM output"
    )
    .expect("failed to register accepted triples counter")
});

static LINES_DISCARDED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "txt2kg_lines_discarded_total",
        "LLM output lines that were not valid triples"
    )
    .expect("failed to register discarded lines counter")
});

/// Ensure collectors are registered.
fn init_collectors() {
    Lazy::force(&PROCESS_COLLECTOR);
    Lazy::force(&COMMAND_DURATION);
    Lazy::force(&COMMAND_TOTAL);
    Lazy::force(&COMMAND_INFLIGHT);
    Lazy::force(&LLM_REQUESTS);
    Lazy::force(&TRIPLES_ACCEPTED);
    Lazy::force(&LINES_DISCARDED);
}

/// Increment inflight gauge for a command.
pub fn record_command_start(command: &'static str) {
    init_collectors();
    COMMAND_INFLIGHT.with_label_values(&[command]).inc();
}

/// Record command completion with duration and status.
pub fn record_command_result(command: &'static str, duration: Duration, success: bool) {
    init_collectors();
    COMMAND_INFLIGHT.with_label_values(&[command]).dec();
    COMMAND_DURATION
        .with_label_values(&[command])
        .observe(duration.as_secs_f64());
    COMMAND_TOTAL
        .with_label_values(&[command, if success { "ok" } else { "error" }])
        .inc();
}

/// Count one LLM completion.
pub fn record_llm_request(backend: &'static str, success: bool) {
    init_collectors();
    LLM_REQUESTS
        .with_label_values(&[backend, if success { "ok" } else { "error" }])
        .inc();
}

/// Count the outcome of parsing one LLM response.
pub fn record_parsed_lines(accepted: usize, discarded: usize) {
    init_collectors();
    TRIPLES_ACCEPTED.inc_by(accepted as u64);
    LINES_DISCARDED.inc_by(discarded as u64);
}

fn text_response(
    status: StatusCode,
    content_type: &str,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    if let Ok(value) = HeaderValue::from_str(content_type) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}

async fn metrics_response() -> Result<Response<Full<Bytes>>, Infallible> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(err) = encoder.encode(&prometheus::gather(), &mut buffer) {
        error!("Failed to encode metrics: {}", err);
        return Ok(text_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "text/plain",
            "encode error",
        ));
    }

    Ok(text_response(StatusCode::OK, encoder.format_type(), buffer))
}

async fn handle_request(req: Request<Incoming>) -> Result<Response<Full<Bytes>>, Infallible> {
    match req.uri().path() {
        "/metrics" => metrics_response().await,
        _ => Ok(text_response(StatusCode::NOT_FOUND, "text/plain", Bytes::new())),
    }
}

async fn serve(addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Prometheus metrics endpoint started");

    loop {
        let (stream, peer) = listener.accept().await?;
        let service = service_fn(handle_request);
        let io = TokioIo::new(stream);

        tokio::spawn(async move {
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                warn!(?peer, "Metrics connection error: {}", err);
            }
        });
    }
}

/// Spawn the metrics HTTP endpoint on the given address.
pub fn spawn_metrics_server(addr: SocketAddr) {
    init_collectors();
    tokio::spawn(async move {
        if let Err(err) = serve(addr).await {
            error!(%addr, "Metrics server failed: {}", err);
        }
    });
}
