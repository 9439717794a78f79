//! Mock data source for testing without network calls.

use super::{DataSource, DataSourceError};
use crate::domain::RawFill;
use async_trait::async_trait;
use std::collections::HashMap;

/// Mock data source that returns predefined fills per user.
#[derive(Debug, Clone, Default)]
pub struct MockDataSource {
    fills: HashMap<String, Vec<RawFill>>,
    failures: HashMap<String, DataSourceError>,
}

impl MockDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fill payload for a user.
    pub fn with_fill(mut self, user: &str, fill: serde_json::Value) -> Self {
        self.fills
            .entry(user.to_ascii_lowercase())
            .or_default()
            .push(RawFill::new(fill));
        self
    }

    /// Add multiple fill payloads for a user.
    pub fn with_fills(mut self, user: &str, fills: Vec<serde_json::Value>) -> Self {
        self.fills
            .entry(user.to_ascii_lowercase())
            .or_default()
            .extend(fills.into_iter().map(RawFill::new));
        self
    }

    /// Make every fetch for `user` fail with `error`.
    pub fn with_failure(mut self, user: &str, error: DataSourceError) -> Self {
        self.failures.insert(user.to_ascii_lowercase(), error);
        self
    }
}

#[async_trait]
impl DataSource for MockDataSource {
    async fn fetch_user_fills(&self, user: &str) -> Result<Vec<RawFill>, DataSourceError> {
        let key = user.to_ascii_lowercase();
        if let Some(err) = self.failures.get(&key) {
            return Err(err.clone());
        }
        Ok(self.fills.get(&key).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_datasource_fetch_fills() {
        let mock = MockDataSource::new().with_fill("0xAbC", json!({"coin": "BTC"}));
        let fills = mock.fetch_user_fills("0xabc").await.unwrap();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].coin(), Some("BTC"));
    }

    #[tokio::test]
    async fn test_mock_datasource_unknown_user_is_empty() {
        let mock = MockDataSource::new().with_fill("0xabc", json!({"coin": "BTC"}));
        assert!(mock.fetch_user_fills("0xdef").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_mock_datasource_failure() {
        let mock = MockDataSource::new().with_failure("0xabc", DataSourceError::RateLimited);
        let err = mock.fetch_user_fills("0xabc").await.unwrap_err();
        assert_eq!(err, DataSourceError::RateLimited);
    }
}
