use actix_web::HttpResponse;
use prometheus::{Encoder, Histogram, IntCounterVec, TextEncoder};

lazy_static::lazy_static! {
    pub static ref URL_VERDICTS_TOTAL: IntCounterVec = prometheus::register_int_counter_vec!(
        "url_verdicts_total",
        "URL verdicts by outcome",
        &["outcome"]
    ).expect("url_verdicts_total metric can be registered");

    pub static ref URL_SCORING_ERRORS_TOTAL: IntCounterVec = prometheus::register_int_counter_vec!(
        "url_scoring_errors_total",
        "URL scoring failures by error kind",
        &["kind"]
    ).expect("url_scoring_errors_total metric can be registered");

    pub static ref FEED_QUOTA_DECISIONS_TOTAL: IntCounterVec = prometheus::register_int_counter_vec!(
        "feed_quota_decisions_total",
        "Feed quota checks by decision",
        &["decision"]
    ).expect("feed_quota_decisions_total metric can be registered");

    pub static ref INFERENCE_DURATION_SECONDS: Histogram = prometheus::register_histogram!(
        "url_inference_duration_seconds",
        "Classifier inference latency",
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
    ).expect("url_inference_duration_seconds metric can be registered");
}

/// Prometheus text exposition of the default registry.
pub async fn metrics_handler() -> HttpResponse {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    match encoder.encode(&prometheus::gather(), &mut buffer) {
        Ok(()) => HttpResponse::Ok()
            .content_type(encoder.format_type())
            .body(buffer),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}
