//! Metrics and observability utilities
//!
//! Provides metric registration and recording helpers with standardized
//! naming conventions for the generation engine.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};

/// Metrics prefix for all Vestia metrics
pub const METRICS_PREFIX: &str = "vestia";

/// Register all metric descriptions
pub fn register_metrics() {
    // Generation metrics
    describe_counter!(
        format!("{}_generations_total", METRICS_PREFIX),
        Unit::Count,
        "Total outfit generation requests"
    );

    describe_histogram!(
        format!("{}_generation_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Outfit generation latency in seconds"
    );

    // Recommender metrics
    describe_counter!(
        format!("{}_recommender_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total recommendation provider requests"
    );

    describe_histogram!(
        format!("{}_recommender_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Recommendation provider latency in seconds"
    );

    // Cache metrics
    describe_counter!(
        format!("{}_session_cache_hits_total", METRICS_PREFIX),
        Unit::Count,
        "Generation session cache hits"
    );

    describe_counter!(
        format!("{}_session_cache_misses_total", METRICS_PREFIX),
        Unit::Count,
        "Generation session cache misses"
    );

    tracing::info!("Metrics registered");
}

/// Record a completed generation request
pub fn record_generation(duration_secs: f64, mode: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_generations_total", METRICS_PREFIX),
        "mode" => mode.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_generation_duration_seconds", METRICS_PREFIX),
        "mode" => mode.to_string()
    )
    .record(duration_secs);
}

/// Record a recommendation provider call
pub fn record_recommender(duration_secs: f64, model: &str, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_recommender_requests_total", METRICS_PREFIX),
        "model" => model.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if success {
        histogram!(
            format!("{}_recommender_duration_seconds", METRICS_PREFIX),
            "model" => model.to_string()
        )
        .record(duration_secs);
    }
}

/// Record a session cache lookup
pub fn record_session_cache(hit: bool) {
    if hit {
        counter!(format!("{}_session_cache_hits_total", METRICS_PREFIX)).increment(1);
    } else {
        counter!(format!("{}_session_cache_misses_total", METRICS_PREFIX)).increment(1);
    }
}
