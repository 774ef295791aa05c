//! Prometheus metrics for the authentication surface.
//!
//! Metrics are recorded through the `metrics` facade and exported in Prometheus
//! text format when a scrape listener is configured (`METRICS_BIND`). Without
//! an installed recorder every call here is a no-op.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use shopping_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::login_attempts_total(true);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

/// Increment login attempts counter.
pub fn login_attempts_total(success: bool) {
    metrics::counter!("login_attempts_total",
        "success" => success.to_string()
    )
    .increment(1);
}

/// Increment registrations counter by outcome (`created`, `taken`, `invalid`, `error`).
pub fn registrations_total(outcome: &'static str) {
    metrics::counter!("registrations_total", "outcome" => outcome).increment(1);
}

/// Increment requests rejected by the route guard.
pub fn guard_rejections_total() {
    metrics::counter!("guard_rejections_total").increment(1);
}

/// Increment logouts counter.
pub fn logouts_total() {
    metrics::counter!("logouts_total").increment(1);
}

/// Add to the expired sessions removed by the sweep.
pub fn sessions_pruned_total(count: u64) {
    metrics::counter!("sessions_pruned_total").increment(count);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_harmless() {
        login_attempts_total(true);
        login_attempts_total(false);
        registrations_total("created");
        guard_rejections_total();
        logouts_total();
        sessions_pruned_total(3);
    }
}
