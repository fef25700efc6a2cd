//! Request metrics
//!
//! Prometheus counters kept in a registry owned by the application state,
//! so several servers in one process (or one test binary) never collide.

use prometheus::{IntCounterVec, Opts, Registry, TextEncoder};

/// Counters for the HTTP layer
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    http_requests: IntCounterVec,
}

impl Metrics {
    /// Create a fresh registry with all counters registered
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let http_requests = IntCounterVec::new(
            Opts::new(
                "requests_total",
                "Total number of HTTP requests handled by the kv service.",
            )
            .subsystem("http"),
            &["handler", "method", "status"],
        )?;
        registry.register(Box::new(http_requests.clone()))?;

        Ok(Self {
            registry,
            http_requests,
        })
    }

    /// Count one handled request
    pub fn observe(&self, handler: &str, method: &str, status: u16) {
        let status = status.to_string();
        self.http_requests
            .with_label_values(&[handler, method, status.as_str()])
            .inc();
    }

    /// Current count for one label combination
    pub fn request_count(&self, handler: &str, method: &str, status: u16) -> u64 {
        let status = status.to_string();
        self.http_requests
            .with_label_values(&[handler, method, status.as_str()])
            .get()
    }

    /// Render every metric in the Prometheus text format
    pub fn render(&self) -> prometheus::Result<String> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_per_label_set() {
        let metrics = Metrics::new().unwrap();

        metrics.observe("set", "POST", 200);
        metrics.observe("set", "POST", 200);
        metrics.observe("set", "POST", 400);

        assert_eq!(metrics.request_count("set", "POST", 200), 2);
        assert_eq!(metrics.request_count("set", "POST", 400), 1);
        assert_eq!(metrics.request_count("get", "GET", 200), 0);
    }

    #[test]
    fn test_render_text_format() {
        let metrics = Metrics::new().unwrap();
        metrics.observe("health", "GET", 200);

        let text = metrics.render().unwrap();
        assert!(text.contains("http_requests_total"));
        assert!(text.contains("handler=\"health\""));
    }
}
