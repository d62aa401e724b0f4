use crate::error::Result;
use crate::models::ScanRecord;
use async_trait::async_trait;
use dashmap::DashMap;

/// Append-only, per-caller log of scoring results.
#[async_trait]
pub trait HistoryRecorder: Send + Sync {
    async fn append(&self, user_id: &str, record: ScanRecord) -> Result<()>;

    /// Records for `user_id`, oldest first.
    async fn list(&self, user_id: &str) -> Result<Vec<ScanRecord>>;
}

/// Process-local recorder.
#[derive(Default)]
pub struct InMemoryHistory {
    records: DashMap<String, Vec<ScanRecord>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryRecorder for InMemoryHistory {
    async fn append(&self, user_id: &str, record: ScanRecord) -> Result<()> {
        self.records
            .entry(user_id.to_string())
            .or_default()
            .push(record);
        Ok(())
    }

    async fn list(&self, user_id: &str) -> Result<Vec<ScanRecord>> {
        Ok(self
            .records
            .get(user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Verdict;

    #[tokio::test]
    async fn test_history_is_ordered_and_per_caller() {
        let history = InMemoryHistory::new();
        let verdict = Verdict::from_probability(0.9);

        history
            .append("alice", ScanRecord::new("https://one.example", &verdict))
            .await
            .unwrap();
        history
            .append("alice", ScanRecord::new("https://two.example", &verdict))
            .await
            .unwrap();
        history
            .append("bob", ScanRecord::new("https://three.example", &verdict))
            .await
            .unwrap();

        let alice: Vec<_> = history
            .list("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.url)
            .collect();
        assert_eq!(alice, vec!["https://one.example", "https://two.example"]);
        assert_eq!(history.list("bob").await.unwrap().len(), 1);
        assert!(history.list("carol").await.unwrap().is_empty());
    }
}
