use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::AppState;

/// Counts the request by method in the metric store before routing, then
/// stamps the response with `X-Response-Time-Us` and `Server-Timing`.
pub async fn http_metrics_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    state.metrics.increment_http_request(method.as_str());
    let path = req.uri().path().to_owned();

    let start = Instant::now();
    let mut response = next.run(req).await;
    let elapsed = start.elapsed();
    stamp_timing(&mut response, elapsed);

    // SSE connections stay open; their duration says nothing
    if !path.ends_with("/stream") {
        tracing::info!(
            %method,
            %path,
            status = response.status().as_u16(),
            latency_us = elapsed.as_micros() as u64,
            "request"
        );
    }

    response
}

fn stamp_timing(response: &mut Response, elapsed: Duration) {
    let headers = response.headers_mut();
    if let Ok(val) = HeaderValue::from_str(&elapsed.as_micros().to_string()) {
        headers.insert("x-response-time-us", val);
    }
    let server_timing = format!("total;dur={:.3}", elapsed.as_secs_f64() * 1000.0);
    if let Ok(val) = HeaderValue::from_str(&server_timing) {
        headers.insert("server-timing", val);
    }
}
