pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use config::{Config, QuotaConfig};
pub use error::{Result, UrlGuardError};
pub use handlers::{configure, AppState};
pub use models::{RiskSignals, ScanRecord, UrlAssessment, Verdict};
pub use services::{
    AccessResolver, AccessTier, EnsemblePolicy, EnsembleScorer, HeuristicEvaluator,
    PhishingClassifier, QuotaTracker, TieredContentLimiter,
};
