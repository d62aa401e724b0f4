use crate::error::{Result, UrlGuardError};
use crate::models::{ArticleSummary, FeedBatch};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Fixed query for cybersecurity coverage.
const CYBERSECURITY_QUERY: &str =
    r#"cybersecurity OR "cyber security" OR "data breach" OR "hacking" OR "malware" OR "ransomware""#;

/// Source of article pages. Quota gating happens before any call reaches it.
#[async_trait]
pub trait FeedProvider: Send + Sync {
    async fn fetch(&self, page: u32, page_size: u32) -> Result<FeedBatch>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    total_results: u64,
    #[serde(default)]
    articles: Vec<ArticleSummary>,
    message: Option<String>,
}

/// NewsAPI `everything` endpoint client.
pub struct NewsApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl NewsApiClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UrlGuardError::Config(format!("Failed to build HTTP client: {}", e)))?;

        if api_key.is_none() {
            tracing::warn!("NEWSAPI_KEY is not set; feed requests will be rejected upstream");
        }

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl FeedProvider for NewsApiClient {
    async fn fetch(&self, page: u32, page_size: u32) -> Result<FeedBatch> {
        let page = page.to_string();
        let page_size = page_size.to_string();
        let mut params = vec![
            ("q", CYBERSECURITY_QUERY),
            ("language", "en"),
            ("sortBy", "publishedAt"),
            ("pageSize", page_size.as_str()),
            ("page", page.as_str()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("apiKey", key.as_str()));
        }

        let response = self
            .http
            .get(format!("{}/everything", self.base_url))
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        let body: NewsApiResponse = response.json().await?;

        if !status.is_success() || body.status != "ok" {
            return Err(UrlGuardError::UpstreamFailure(format!(
                "news provider returned {}: {}",
                status,
                body.message.unwrap_or_else(|| body.status.clone())
            )));
        }

        tracing::debug!(
            returned = body.articles.len(),
            total_results = body.total_results,
            "Fetched news page"
        );

        Ok(FeedBatch {
            articles: body.articles,
            total_results: body.total_results,
        })
    }
}
