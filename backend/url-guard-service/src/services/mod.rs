pub mod access;
pub mod classifier;
pub mod content_limiter;
pub mod ensemble;
pub mod heuristics;
pub mod history;
pub mod news_feed;
pub mod quota;

pub use access::{AccessResolver, AccessTier, Caller};
pub use classifier::{ModelLoader, OnnxModelLoader, PhishingClassifier, UrlModel};
pub use content_limiter::{DeliveryCursor, Shaped, TieredContentLimiter};
pub use ensemble::{EnsemblePolicy, EnsembleScorer};
pub use heuristics::HeuristicEvaluator;
pub use history::{HistoryRecorder, InMemoryHistory};
pub use news_feed::{FeedProvider, NewsApiClient};
pub use quota::{QuotaDecision, QuotaTracker};
