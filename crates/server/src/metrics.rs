//! Prometheus metrics for the HTTP server, plus the shared registry the
//! `/metrics` endpoint renders.

use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP requests by method and status class.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("kuckmal_http_requests_total", "Total HTTP requests"),
        &["method", "status"],
    )
    .unwrap()
});

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();

    for metric in kuckmal_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Count a finished request.
pub async fn track_requests(
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = request.method().to_string();
    let response = next.run(request).await;
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, response.status().as_str()])
        .inc();
    response
}

/// Render the registry in Prometheus text format.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if encoder.encode(&REGISTRY.gather(), &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_initializes() {
        // Forces the Lazy, which panics on duplicate registration
        let _ = &*REGISTRY;
    }

    #[test]
    fn test_render_contains_counters() {
        HTTP_REQUESTS_TOTAL.with_label_values(&["GET", "200"]).inc();
        let text = render();
        assert!(text.contains("kuckmal_http_requests_total"));
    }
}
