//! HTTP surface of the service
pub mod health;
pub mod news;
pub mod phishing;

use crate::error::UrlGuardError;
use crate::metrics::metrics_handler;
use crate::services::{
    AccessResolver, Caller, EnsembleScorer, FeedProvider, HistoryRecorder, QuotaTracker,
    TieredContentLimiter,
};
use actix_web::{http::header::AUTHORIZATION, web, HttpRequest};
use std::sync::Arc;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub scorer: Arc<EnsembleScorer>,
    pub history: Arc<dyn HistoryRecorder>,
    pub quota: Arc<QuotaTracker>,
    pub limiter: TieredContentLimiter,
    pub feed: Arc<dyn FeedProvider>,
    pub access: Arc<AccessResolver>,
}

impl AppState {
    /// Resolve the caller from the request's `Authorization` header.
    pub fn caller(&self, req: &HttpRequest) -> Caller {
        let authorization = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        self.access.resolve(authorization)
    }
}

/// Register routes and extractor error handling.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        UrlGuardError::InvalidInput(format!("Invalid request body: {}", err)).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        UrlGuardError::InvalidInput(format!("Invalid query string: {}", err)).into()
    }))
    .route("/health", web::get().to(health::health))
    .route("/ready", web::get().to(health::ready))
    .route("/metrics", web::get().to(metrics_handler))
    .service(
        web::scope("/api/phishing")
            .route("/check", web::post().to(phishing::check_url))
            .route("/history", web::get().to(phishing::history)),
    )
    .service(
        web::scope("/api/news").route("/cybersecurity", web::get().to(news::cybersecurity_news)),
    );
}
