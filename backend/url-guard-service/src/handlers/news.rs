//! News handlers - quota-gated, tier-shaped cybersecurity feed
use actix_web::{web, HttpRequest, HttpResponse};

use crate::error::{Result, UrlGuardError};
use crate::handlers::AppState;
use crate::models::{FeedPage, FeedQuery, RateLimitInfo};
use crate::services::{Caller, DeliveryCursor, QuotaDecision};

const DEFAULT_PAGE_SIZE: u32 = 10;

pub async fn cybersecurity_news(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<FeedQuery>,
) -> Result<HttpResponse> {
    let caller = state.caller(&req);
    let page = query.page.unwrap_or(1);
    if page == 0 {
        return Err(UrlGuardError::InvalidInput("page starts at 1".to_string()));
    }

    let batch_size = state
        .quota
        .batch_size(query.page_size.unwrap_or(DEFAULT_PAGE_SIZE));
    let mut cursor = DeliveryCursor::for_page(page, batch_size);
    let max_articles = state.limiter.max_items(caller.tier);

    // A guest past the ceiling gets nothing more, so don't spend quota on it
    if state.limiter.is_exhausted(caller.tier, &cursor) {
        tracing::debug!(page, "Guest article ceiling reached");
        return Ok(HttpResponse::Ok().json(FeedPage {
            articles: Vec::new(),
            total_results: max_articles.unwrap_or_default() as u64,
            has_more: false,
            rate_limit: rate_limit_info(&caller, state.quota.peek(), max_articles),
        }));
    }

    let decision = state.quota.try_consume();
    if let Some(rejection) = decision.rejection(state.quota.config().ceiling) {
        return Err(rejection);
    }

    let batch = state.feed.fetch(page, batch_size).await?;
    let fetched = batch.articles.len();
    let shaped = state.limiter.shape(batch.articles, caller.tier, &mut cursor);

    let total_results = match max_articles {
        Some(ceiling) => batch.total_results.min(ceiling as u64),
        None => batch.total_results,
    };
    let has_more = !shaped.exhausted
        && fetched == batch_size as usize
        && (cursor.delivered() as u64) < batch.total_results;

    tracing::info!(
        page,
        batch_size,
        returned = shaped.items.len(),
        authenticated = caller.is_authenticated(),
        remaining_requests = decision.remaining,
        "Served news page"
    );

    Ok(HttpResponse::Ok().json(FeedPage {
        articles: shaped.items,
        total_results,
        has_more,
        rate_limit: rate_limit_info(&caller, decision, max_articles),
    }))
}

fn rate_limit_info(
    caller: &Caller,
    decision: QuotaDecision,
    max_articles: Option<usize>,
) -> RateLimitInfo {
    RateLimitInfo {
        remaining_requests: decision.remaining,
        reset_time: decision.reset_at,
        is_authenticated: caller.is_authenticated(),
        max_articles,
    }
}
