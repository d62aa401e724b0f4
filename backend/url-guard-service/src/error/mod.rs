use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UrlGuardError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Scoring model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Scoring failed: {0}")]
    ScoringFailed(String),

    #[error("Rate limit exceeded: {limit} requests per window, resets at {reset_at}")]
    QuotaExceeded { reset_at: DateTime<Utc>, limit: u32 },

    #[error("Upstream failure: {0}")]
    UpstreamFailure(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl UrlGuardError {
    /// Stable machine-readable code for response bodies and metric labels.
    pub fn code(&self) -> &'static str {
        match self {
            UrlGuardError::InvalidInput(_) => "INVALID_INPUT",
            UrlGuardError::Unauthorized(_) => "UNAUTHENTICATED",
            UrlGuardError::ModelUnavailable(_) => "MODEL_UNAVAILABLE",
            UrlGuardError::ScoringFailed(_) => "SCORING_FAILED",
            UrlGuardError::QuotaExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            UrlGuardError::UpstreamFailure(_) => "UPSTREAM_FAILURE",
            UrlGuardError::Config(_) => "CONFIGURATION_ERROR",
            UrlGuardError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<reqwest::Error> for UrlGuardError {
    fn from(err: reqwest::Error) -> Self {
        UrlGuardError::UpstreamFailure(err.to_string())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: &'static str,
    message: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reset_time: Option<String>,
}

impl ResponseError for UrlGuardError {
    fn status_code(&self) -> StatusCode {
        match self {
            UrlGuardError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            UrlGuardError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            UrlGuardError::ModelUnavailable(_) | UrlGuardError::ScoringFailed(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            UrlGuardError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            UrlGuardError::UpstreamFailure(_) => StatusCode::BAD_GATEWAY,
            UrlGuardError::Config(_) | UrlGuardError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error, message, reset_time) = match self {
            UrlGuardError::InvalidInput(msg) => ("Bad Request", msg.clone(), None),
            UrlGuardError::Unauthorized(msg) => ("Unauthorized", msg.clone(), None),
            UrlGuardError::ModelUnavailable(e) => {
                tracing::error!("Scoring model unavailable: {}", e);
                ("Scoring unavailable", "URL scoring is currently unavailable".to_string(), None)
            }
            UrlGuardError::ScoringFailed(e) => {
                tracing::warn!("Scoring failed: {}", e);
                ("Scoring unavailable", "URL scoring failed, please retry".to_string(), None)
            }
            UrlGuardError::QuotaExceeded { reset_at, limit } => (
                "Rate limit exceeded",
                format!(
                    "The maximum number of requests ({}) for this window has been reached. Please try again later.",
                    limit
                ),
                Some(reset_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ),
            UrlGuardError::UpstreamFailure(e) => {
                tracing::warn!("Upstream failure: {}", e);
                ("Upstream failure", "Failed to fetch news articles".to_string(), None)
            }
            UrlGuardError::Config(e) | UrlGuardError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                ("Internal Server Error", "Internal server error".to_string(), None)
            }
        };

        HttpResponse::build(self.status_code()).json(ErrorBody {
            error,
            message,
            code: self.code(),
            reset_time,
        })
    }
}

pub type Result<T> = std::result::Result<T, UrlGuardError>;
