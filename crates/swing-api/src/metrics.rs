//! Prometheus metrics for the detection server.

use std::sync::OnceLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex_lite::Regex;

/// Install the Prometheus recorder.
/// Returns a handle that renders the scrape output.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names.
pub mod names {
    // HTTP
    pub const HTTP_REQUESTS_TOTAL: &str = "swing_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "swing_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "swing_http_requests_in_flight";

    // WebSocket
    pub const WS_CONNECTIONS_TOTAL: &str = "swing_ws_connections_total";
    pub const WS_MESSAGES_SENT: &str = "swing_ws_messages_sent_total";
    pub const WS_MESSAGES_RECEIVED: &str = "swing_ws_messages_received_total";

    // Detection
    pub const SESSIONS_ACTIVE: &str = "swing_sessions_active";
    pub const ANALYSES_DISPATCHED_TOTAL: &str = "swing_analyses_dispatched_total";
    pub const ANALYSES_COMPLETED_TOTAL: &str = "swing_analyses_completed_total";
    pub const ANALYSIS_DURATION_SECONDS: &str = "swing_analysis_duration_seconds";
    pub const SWINGS_DETECTED_TOTAL: &str = "swing_swings_detected_total";

    // Rate limiting
    pub const RATE_LIMIT_HITS_TOTAL: &str = "swing_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record an accepted WebSocket connection.
pub fn record_ws_connection(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::WS_CONNECTIONS_TOTAL, &labels).increment(1);
}

/// Record a status message sent to a client.
pub fn record_ws_message_sent(endpoint: &str, status: &str) {
    let labels = [
        ("endpoint", endpoint.to_string()),
        ("status", status.to_string()),
    ];
    counter!(names::WS_MESSAGES_SENT, &labels).increment(1);
}

/// Record a client message.
pub fn record_ws_message_received(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::WS_MESSAGES_RECEIVED, &labels).increment(1);
}

pub fn set_active_sessions(count: usize) {
    gauge!(names::SESSIONS_ACTIVE).set(count as f64);
}

pub fn record_analysis_dispatched(provider: &str) {
    let labels = [("provider", provider.to_string())];
    counter!(names::ANALYSES_DISPATCHED_TOTAL, &labels).increment(1);
}

/// Record a finished analysis and how long the provider took.
pub fn record_analysis_completed(provider: &str, outcome: &str, duration_secs: f64) {
    let labels = [
        ("provider", provider.to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!(names::ANALYSES_COMPLETED_TOTAL, &labels).increment(1);
    histogram!(names::ANALYSIS_DURATION_SECONDS, "provider" => provider.to_string()).record(duration_secs);
}

pub fn record_swing_detected(provider: &str) {
    let labels = [("provider", provider.to_string())];
    counter!(names::SWINGS_DETECTED_TOTAL, &labels).increment(1);
}

/// Record a rejected request.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

fn session_path_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/sessions/[A-Za-z0-9_.-]+").expect("valid session path regex"))
}

fn numeric_segment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/[0-9]+(/|$)").expect("valid numeric segment regex"))
}

/// Sanitize path for metrics labels (collapse session ids and numbers).
fn sanitize_path(path: &str) -> String {
    let path = session_path_regex().replace_all(path, "/sessions/:session_id");
    let path = numeric_segment_regex().replace_all(&path, "/:id$1");
    path.to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    record_http_request(&method, &path, response.status().as_u16(), start.elapsed().as_secs_f64());

    response
}
