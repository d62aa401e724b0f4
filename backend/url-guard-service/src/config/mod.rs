use crate::error::{Result, UrlGuardError};
use crate::services::ensemble::EnsemblePolicy;
use chrono::Duration;
use std::env;
use std::str::FromStr;

/// Longest accepted feed quota window (one year).
const MAX_QUOTA_WINDOW_SECS: i64 = 366 * 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    // Server configuration
    pub http_port: u16,
    pub service_name: String,
    pub environment: String,

    // Classifier
    pub model_path: String,
    pub model_input_name: String,
    pub model_output_name: String,
    pub ensemble_policy: EnsemblePolicy,

    // Access tokens
    pub jwt_secret: String,

    // Feed upstream
    pub news_api_key: Option<String>,
    pub news_api_base_url: String,
    pub upstream_timeout_secs: u64,

    // Feed quota
    pub quota: QuotaConfig,
    pub guest_article_ceiling: usize,
}

/// Limits applied to calls delegated to the feed provider.
#[derive(Debug, Clone, Copy)]
pub struct QuotaConfig {
    pub window: Duration,
    pub ceiling: u32,
    pub per_call_batch_cap: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            window: Duration::hours(1),
            ceiling: 50,
            per_call_batch_cap: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| UrlGuardError::Config("JWT_SECRET must be set".to_string()))?;
        if jwt_secret.trim().is_empty() {
            return Err(UrlGuardError::Config("JWT_SECRET must not be empty".to_string()));
        }

        let ensemble_policy = match env::var("ENSEMBLE_POLICY")
            .unwrap_or_else(|_| "escalate".to_string())
            .to_lowercase()
            .as_str()
        {
            "escalate" => EnsemblePolicy::escalate(parse_var("ESCALATION_MIN_SIGNALS", 2)?),
            "model_only" => EnsemblePolicy::ModelOnly,
            other => {
                return Err(UrlGuardError::Config(format!(
                    "Unknown ENSEMBLE_POLICY: {}",
                    other
                )))
            }
        };

        let window_secs: i64 = parse_var("FEED_QUOTA_WINDOW_SECS", 3600)?;
        if !(1..=MAX_QUOTA_WINDOW_SECS).contains(&window_secs) {
            return Err(UrlGuardError::Config(format!(
                "FEED_QUOTA_WINDOW_SECS must be between 1 and {}, got {}",
                MAX_QUOTA_WINDOW_SECS, window_secs
            )));
        }
        let quota_window = Duration::try_seconds(window_secs).ok_or_else(|| {
            UrlGuardError::Config(format!(
                "FEED_QUOTA_WINDOW_SECS is out of range: {}",
                window_secs
            ))
        })?;

        Ok(Self {
            http_port: parse_var("HTTP_PORT", 5000)?,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "url-guard-service".to_string()),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            model_path: env::var("PHISHING_MODEL_PATH")
                .unwrap_or_else(|_| "models/phishing_url.onnx".to_string()),
            model_input_name: env::var("MODEL_INPUT_NAME").unwrap_or_else(|_| "inputs".to_string()),
            model_output_name: env::var("MODEL_OUTPUT_NAME")
                .unwrap_or_else(|_| "probabilities".to_string()),
            ensemble_policy,
            jwt_secret,
            news_api_key: env::var("NEWSAPI_KEY").ok().filter(|k| !k.trim().is_empty()),
            news_api_base_url: env::var("NEWSAPI_BASE_URL")
                .unwrap_or_else(|_| "https://newsapi.org/v2".to_string()),
            upstream_timeout_secs: parse_var("UPSTREAM_TIMEOUT_SECS", 10)?,
            quota: QuotaConfig {
                window: quota_window,
                ceiling: parse_var("FEED_QUOTA_CEILING", 50)?,
                per_call_batch_cap: parse_var("FEED_BATCH_CAP", 10)?,
            },
            guest_article_ceiling: parse_var("GUEST_ARTICLE_CEILING", 18)?,
        })
    }
}

/// Read an optional variable, falling back to `default` when unset.
/// A value that is set but unparsable is a configuration error.
fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| UrlGuardError::Config(format!("{} has an invalid value: {}", key, raw))),
        Err(_) => Ok(default),
    }
}
