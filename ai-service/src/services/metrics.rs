//! Prometheus metrics for ai-service.
//!
//! HTTP request metrics come from `service_core::middleware::metrics`; this
//! module adds the detection, chatbot and provider series and owns the
//! exporter handle that `/metrics` renders.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

const PROVIDER_LATENCY_BUCKETS: [f64; 9] = [0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

/// Install the global Prometheus recorder. Later calls are no-ops.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_some() {
        return;
    }

    let builder = match PrometheusBuilder::new().set_buckets_for_metric(
        metrics_exporter_prometheus::Matcher::Full("genai_provider_latency_seconds".to_string()),
        &PROVIDER_LATENCY_BUCKETS,
    ) {
        Ok(builder) => builder,
        Err(e) => {
            tracing::warn!(error = %e, "Invalid histogram buckets, using defaults");
            PrometheusBuilder::new()
        }
    };

    match builder.install_recorder() {
        Ok(handle) => {
            let _ = METRICS_HANDLE.set(handle);
            describe();
        }
        Err(e) => tracing::warn!(error = %e, "Failed to install Prometheus recorder"),
    }
}

fn describe() {
    describe_counter!(
        "snake_detections_total",
        "Snake detection requests by result source"
    );
    describe_counter!(
        "chat_queries_total",
        "Chatbot queries by category and result source"
    );
    describe_counter!(
        "genai_tokens_total",
        "Generative model tokens by model and direction"
    );
    describe_histogram!(
        "genai_provider_latency_seconds",
        Unit::Seconds,
        "Generative model call latency"
    );
}

/// Render all series in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// `source` is `gemini`, `mock` or `failed`.
pub fn record_detection(source: &str) {
    counter!("snake_detections_total", "source" => source.to_string()).increment(1);
}

pub fn record_chat(category: &str, source: &str) {
    counter!(
        "chat_queries_total",
        "category" => category.to_string(),
        "source" => source.to_string()
    )
    .increment(1);
}

pub fn record_provider_latency(model: &str, seconds: f64) {
    histogram!("genai_provider_latency_seconds", "model" => model.to_string()).record(seconds);
}

/// Token usage reported by the provider. Negative counts are ignored.
pub fn record_tokens(model: &str, input_tokens: i32, output_tokens: i32) {
    for (direction, tokens) in [("input", input_tokens), ("output", output_tokens)] {
        if let Ok(tokens) = u64::try_from(tokens) {
            counter!(
                "genai_tokens_total",
                "model" => model.to_string(),
                "direction" => direction
            )
            .increment(tokens);
        }
    }
}
