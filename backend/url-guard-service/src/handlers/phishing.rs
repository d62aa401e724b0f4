//! Phishing handlers - URL scoring and per-caller history
use actix_web::{web, HttpRequest, HttpResponse};

use crate::error::{Result, UrlGuardError};
use crate::handlers::AppState;
use crate::models::{CheckUrlRequest, ScanRecord};

/// Score a URL and append the verdict to the caller's history
pub async fn check_url(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Json<CheckUrlRequest>,
) -> Result<HttpResponse> {
    let caller = state.caller(&req);
    let user_id = caller.require_user()?;

    let url = payload
        .into_inner()
        .url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| UrlGuardError::InvalidInput("URL is required".to_string()))?;

    tracing::info!(user_id = %user_id, url = %url, "Checking URL");

    let assessment = state.scorer.evaluate(&url).await?;

    state
        .history
        .append(user_id, ScanRecord::new(url, &assessment.verdict))
        .await?;

    Ok(HttpResponse::Ok().json(assessment))
}

/// List the caller's previous checks, oldest first
pub async fn history(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    let caller = state.caller(&req);
    let user_id = caller.require_user()?;

    let records = state.history.list(user_id).await?;
    Ok(HttpResponse::Ok().json(records))
}
