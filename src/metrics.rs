// ===============================
// src/metrics.rs
// ===============================
use std::convert::Infallible;
use std::net::SocketAddr;

use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server, StatusCode};
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use tracing::{error, info};

// Single custom registry (we register everything here)
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

// -------- Refresh cycle --------
pub static CYCLES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("refresh_cycles_total", "refresh cycles by outcome (complete/aborted/discarded)"),
        &["outcome"],
    )
    .unwrap()
});

pub static FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("resource_fetch_total", "resource fetches (labels: resource, result)"),
        &["resource", "result"],
    )
    .unwrap()
});

pub static CYCLE_MS: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("refresh_cycle_duration_ms", "Wall time of one refresh cycle (ms)")
            .buckets(vec![5.0, 25.0, 100.0, 250.0, 500.0, 1_000.0, 3_000.0, 10_000.0]),
    )
    .unwrap()
});

// -------- Command --------
pub static TOGGLES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("toggle_commands_total", "toggle commands by result"),
        &["result"],
    )
    .unwrap()
});

// -------- State --------
pub static STALE_WRITES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "stale_writes_discarded_total",
        "writes dropped because their generation was stopped",
    )
    .unwrap()
});

pub static READY: Lazy<IntGauge> =
    Lazy::new(|| IntGauge::new("dashboard_ready", "1 once the first cycle finished").unwrap());

pub fn init() {
    // Register all metrics to the custom registry
    for m in [
        REGISTRY.register(Box::new(CYCLES.clone())),
        REGISTRY.register(Box::new(FETCHES.clone())),
        REGISTRY.register(Box::new(CYCLE_MS.clone())),
        REGISTRY.register(Box::new(TOGGLES.clone())),
        REGISTRY.register(Box::new(STALE_WRITES.clone())),
        REGISTRY.register(Box::new(READY.clone())),
    ] {
        let _ = m;
    }
}

// Encode all metrics in Prometheus text format
pub fn encode_metrics() -> Vec<u8> {
    let encoder = TextEncoder::new();
    let families = REGISTRY.gather();
    let mut buf = Vec::new();
    if encoder.encode(&families, &mut buf).is_err() || buf.is_empty() {
        buf.extend_from_slice(b"# no metrics\n");
    }
    buf
}

async fn handle(req: Request<Body>) -> Result<Response<Body>, Infallible> {
    match req.uri().path() {
        "/" | "/metrics" => {
            let mut rsp = Response::new(Body::from(encode_metrics()));
            rsp.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
            );
            Ok(rsp)
        }
        _ => {
            let mut rsp = Response::new(Body::empty());
            *rsp.status_mut() = StatusCode::NOT_FOUND;
            Ok(rsp)
        }
    }
}

/// Serve `GET /` and `GET /metrics` until the task is dropped.
pub async fn serve_metrics(port: u16) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let make_svc = make_service_fn(|_conn| async { Ok::<_, Infallible>(service_fn(handle)) });
    let server = match Server::try_bind(&addr) {
        Ok(builder) => builder.serve(make_svc),
        Err(e) => {
            error!(?e, %addr, "metrics bind failed");
            return;
        }
    };
    info!(%addr, "metrics listening on / and /metrics");
    if let Err(e) = server.await {
        error!(?e, "metrics server stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_path_is_404() {
        let req = Request::builder().uri("/nope").body(Body::empty()).unwrap();
        let rsp = handle(req).await.unwrap();
        assert_eq!(rsp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_path_exposes_registry() {
        init();
        STALE_WRITES.inc();
        let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
        let rsp = handle(req).await.unwrap();
        assert_eq!(rsp.status(), StatusCode::OK);
        let body = hyper::body::to_bytes(rsp.into_body()).await.unwrap();
        let text = String::from_utf8_lossy(&body);
        assert!(text.contains("stale_writes_discarded_total"));
    }
}
