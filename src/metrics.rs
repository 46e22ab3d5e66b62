//! Request latency and mutation counters.

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use tracing::debug;

// === Metric Name Constants ===

/// Admin API request latency metric name.
pub const METRIC_REQUEST_LATENCY: &str = "admin_api_request_latency_ms";
/// Failed admin API requests counter metric name.
pub const METRIC_REQUESTS_FAILED: &str = "admin_api_requests_failed_total";
/// Markets created counter metric name.
pub const METRIC_MARKETS_CREATED: &str = "markets_created_total";
/// Markets deleted counter metric name.
pub const METRIC_MARKETS_DELETED: &str = "markets_deleted_total";
/// Betting toggles counter metric name.
pub const METRIC_BETTING_TOGGLES: &str = "betting_toggles_total";
/// Result declarations counter metric name.
pub const METRIC_RESULTS_DECLARED: &str = "results_declared_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_REQUEST_LATENCY,
        "Admin API request latency in milliseconds"
    );

    describe_counter!(
        METRIC_REQUESTS_FAILED,
        "Total number of admin API requests that failed"
    );
    describe_counter!(METRIC_MARKETS_CREATED, "Total number of markets created");
    describe_counter!(METRIC_MARKETS_DELETED, "Total number of markets deleted");
    describe_counter!(
        METRIC_BETTING_TOGGLES,
        "Total number of betting availability toggles"
    );
    describe_counter!(
        METRIC_RESULTS_DECLARED,
        "Total number of result declarations"
    );

    debug!("Metrics initialized");
}

/// Increment failed request counter.
pub fn inc_requests_failed(operation: &'static str) {
    counter!(METRIC_REQUESTS_FAILED, "operation" => operation).increment(1);
}

/// Increment markets created counter.
pub fn inc_markets_created() {
    counter!(METRIC_MARKETS_CREATED).increment(1);
}

/// Increment markets deleted counter.
pub fn inc_markets_deleted() {
    counter!(METRIC_MARKETS_DELETED).increment(1);
}

/// Increment betting toggles counter.
pub fn inc_betting_toggles() {
    counter!(METRIC_BETTING_TOGGLES).increment(1);
}

/// Increment result declarations counter.
pub fn inc_results_declared() {
    counter!(METRIC_RESULTS_DECLARED).increment(1);
}

/// RAII guard for timing one API request.
/// Records latency under the endpoint label when dropped.
pub struct LatencyTimer {
    start: Instant,
    endpoint: &'static str,
}

impl LatencyTimer {
    /// Start timing a request to `endpoint`.
    pub fn new(endpoint: &'static str) -> Self {
        Self {
            start: Instant::now(),
            endpoint,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(METRIC_REQUEST_LATENCY, "endpoint" => self.endpoint).record(self.elapsed_ms());
    }
}

/// Create a latency timer for a request to `endpoint`.
pub fn timer_request(endpoint: &'static str) -> LatencyTimer {
    LatencyTimer::new(endpoint)
}
