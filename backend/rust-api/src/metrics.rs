use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Tutor policy metrics
    pub static ref TUTOR_DECISIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "tutor_decisions_total",
        "Tutor responses by final response type",
        &["response_type"]
    )
    .unwrap();

    pub static ref LEAK_REWRITES_TOTAL: IntCounter = register_int_counter!(
        "leak_rewrites_total",
        "AI replies replaced because a full solution leaked through"
    )
    .unwrap();

    pub static ref RATE_LIMITED_TOTAL: IntCounter = register_int_counter!(
        "rate_limited_total",
        "Requests rejected by the tutor rate limiter"
    )
    .unwrap();

    // Session proxy metrics
    pub static ref EDUPAGE_LOGINS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "edupage_logins_total",
        "EduPage login attempts by result",
        &["result"]
    )
    .unwrap();

    pub static ref PROXY_SESSIONS_ACTIVE: IntGauge = register_int_gauge!(
        "proxy_sessions_active",
        "Number of live EduPage proxy sessions"
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_metrics() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/api/health", "200"])
            .inc();

        let output = render_metrics().unwrap();
        assert!(output.contains("http_requests_total"));
    }
}
