//! Prometheus metrics for genai-gateway.
//!
//! Provides HTTP and generation-specific metrics for observability.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Registry plus every metric registered in it, created together.
pub struct Metrics {
    pub registry: Registry,
    // HTTP metrics
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
    // Generation metrics
    pub genai_requests_total: IntCounterVec,
    pub genai_provider_latency_seconds: HistogramVec,
    pub genai_images_generated_total: IntCounterVec,
}

pub static METRICS: OnceLock<Metrics> = OnceLock::new();

impl Metrics {
    fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "path", "status"],
        )
        .expect("Failed to create http_requests_total metric");

        let http_request_duration = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
            &["method", "path", "status"],
        )
        .expect("Failed to create http_request_duration_seconds metric");

        // outcome: success, validation_error, upstream_error, timeout, ...
        let genai_requests = IntCounterVec::new(
            Opts::new("genai_requests_total", "Total generation requests"),
            &["model", "outcome"],
        )
        .expect("Failed to create genai_requests_total metric");

        let provider_latency = HistogramVec::new(
            HistogramOpts::new(
                "genai_provider_latency_seconds",
                "Generation provider latency in seconds",
            )
            .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
            &["model"],
        )
        .expect("Failed to create genai_provider_latency_seconds metric");

        let images_generated = IntCounterVec::new(
            Opts::new("genai_images_generated_total", "Total images returned"),
            &["model"],
        )
        .expect("Failed to create genai_images_generated_total metric");

        registry
            .register(Box::new(http_requests_total.clone()))
            .expect("Failed to register http_requests_total");
        registry
            .register(Box::new(http_request_duration.clone()))
            .expect("Failed to register http_request_duration_seconds");
        registry
            .register(Box::new(genai_requests.clone()))
            .expect("Failed to register genai_requests_total");
        registry
            .register(Box::new(provider_latency.clone()))
            .expect("Failed to register genai_provider_latency_seconds");
        registry
            .register(Box::new(images_generated.clone()))
            .expect("Failed to register genai_images_generated_total");

        tracing::info!("Prometheus metrics initialized");

        Self {
            registry,
            http_requests_total,
            http_request_duration_seconds: http_request_duration,
            genai_requests_total: genai_requests,
            genai_provider_latency_seconds: provider_latency,
            genai_images_generated_total: images_generated,
        }
    }
}

/// Initialize all metrics. Safe to call more than once, from any thread.
pub fn init_metrics() -> &'static Metrics {
    METRICS.get_or_init(Metrics::new)
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let registry = match METRICS.get() {
        Some(m) => &m.registry,
        None => {
            tracing::error!("Metrics registry not initialized");
            return "# Metrics registry not initialized\n".to_string();
        }
    };

    let metric_families = registry.gather();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return format!("# Failed to encode metrics: {}\n", e);
    }

    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to convert metrics to UTF-8");
            format!("# Failed to convert metrics to UTF-8: {}\n", e)
        }
    }
}

/// Record a completed HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status = status.to_string();
    if let Some(m) = METRICS.get() {
        m.http_requests_total
            .with_label_values(&[method, path, &status])
            .inc();
        m.http_request_duration_seconds
            .with_label_values(&[method, path, &status])
            .observe(duration_secs);
    }
}

/// Record the outcome of a generation request.
pub fn record_genai_request(model: &str, outcome: &str) {
    if let Some(m) = METRICS.get() {
        m.genai_requests_total
            .with_label_values(&[model, outcome])
            .inc();
    }
}

/// Record provider latency.
pub fn record_provider_latency(model: &str, duration_secs: f64) {
    if let Some(m) = METRICS.get() {
        m.genai_provider_latency_seconds
            .with_label_values(&[model])
            .observe(duration_secs);
    }
}

pub fn record_images_generated(model: &str, count: usize) {
    if let Some(m) = METRICS.get() {
        m.genai_images_generated_total
            .with_label_values(&[model])
            .inc_by(count as u64);
    }
}
