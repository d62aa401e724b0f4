use actix_web::{web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;
use url_guard_service::{
    config::Config,
    handlers::{configure, AppState},
    services::{
        AccessResolver, EnsembleScorer, InMemoryHistory, NewsApiClient, PhishingClassifier,
        QuotaTracker, TieredContentLimiter,
    },
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting URL Guard Service...");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        http_port = %config.http_port,
        ensemble_policy = ?config.ensemble_policy,
        "Configuration loaded"
    );

    // Model is loaded lazily on the first scoring request
    let classifier = Arc::new(PhishingClassifier::onnx(
        &config.model_path,
        config.model_input_name.clone(),
        config.model_output_name.clone(),
    ));
    tracing::info!(model_path = %config.model_path, "Phishing classifier registered");

    let feed = NewsApiClient::new(
        config.news_api_base_url.clone(),
        config.news_api_key.clone(),
        Duration::from_secs(config.upstream_timeout_secs),
    )
    .context("Failed to create news feed client")?;

    let state = AppState {
        scorer: Arc::new(EnsembleScorer::new(classifier, config.ensemble_policy)),
        history: Arc::new(InMemoryHistory::new()),
        quota: Arc::new(QuotaTracker::new(config.quota)),
        limiter: TieredContentLimiter::new(config.guest_article_ceiling),
        feed: Arc::new(feed),
        access: Arc::new(AccessResolver::new(&config.jwt_secret)),
    };

    let http_addr = format!("0.0.0.0:{}", config.http_port);
    tracing::info!("HTTP server listening on {}", http_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(configure)
    })
    .bind(&http_addr)
    .with_context(|| format!("Failed to bind HTTP server to {}", http_addr))?
    .run()
    .await
    .context("HTTP server error")?;

    Ok(())
}
