use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSource {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Article summary as returned by the news provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    pub source: Option<ArticleSource>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: String,
    pub url_to_image: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub content: Option<String>,
}

/// One page fetched from the feed provider.
#[derive(Debug, Clone, Default)]
pub struct FeedBatch {
    pub articles: Vec<ArticleSummary>,
    pub total_results: u64,
}

/// Query string of a feed request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitInfo {
    pub remaining_requests: u32,
    pub reset_time: DateTime<Utc>,
    pub is_authenticated: bool,
    /// `None` serializes as `null` for callers without an article ceiling.
    pub max_articles: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub articles: Vec<ArticleSummary>,
    pub total_results: u64,
    pub has_more: bool,
    pub rate_limit: RateLimitInfo,
}
