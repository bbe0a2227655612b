//! Prometheus metrics for the host and the relayed upstream calls

use std::time::Duration;

use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

/// Outcome label values for `upstream_requests_total`
pub mod outcome {
    pub const SUCCESS: &str = "success";
    pub const UPSTREAM_ERROR: &str = "upstream_error";
    pub const UNAVAILABLE: &str = "unavailable";
    pub const MALFORMED: &str = "malformed";
}

pub struct Metrics {
    registry: Registry,
    pub http_requests_total: IntCounter,
    pub http_request_duration_seconds: Histogram,
    pub http_requests_in_flight: IntGauge,
    pub upstream_requests_total: IntCounterVec,
    pub upstream_request_duration_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total =
            IntCounter::new("http_requests_total", "Total HTTP requests served")?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ))?;
        let http_requests_in_flight =
            IntGauge::new("http_requests_in_flight", "HTTP requests currently being served")?;
        let upstream_requests_total = IntCounterVec::new(
            Opts::new(
                "upstream_requests_total",
                "Requests forwarded to the TradingView API server",
            ),
            &["endpoint", "outcome"],
        )?;
        let upstream_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "upstream_request_duration_seconds",
                "TradingView API server round-trip latency in seconds",
            ),
            &["endpoint"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(upstream_requests_total.clone()))?;
        registry.register(Box::new(upstream_request_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            upstream_requests_total,
            upstream_request_duration_seconds,
        })
    }

    pub fn observe_upstream(&self, endpoint: &str, outcome: &str, elapsed: Duration) {
        self.upstream_requests_total
            .with_label_values(&[endpoint, outcome])
            .inc();
        self.upstream_request_duration_seconds
            .with_label_values(&[endpoint])
            .observe(elapsed.as_secs_f64());
    }

    /// Render all metrics in the Prometheus text format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
