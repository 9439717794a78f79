//! Hyperliquid Info API client.

use super::{DataSource, DataSourceError};
use crate::domain::RawFill;
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.hyperliquid.xyz";

/// Hyperliquid data source using the public Info API.
#[derive(Debug, Clone)]
pub struct HyperliquidDataSource {
    client: Client,
    base_url: String,
    max_elapsed: Duration,
}

impl HyperliquidDataSource {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            max_elapsed: Duration::from_secs(30),
        }
    }

    pub fn default_url() -> Self {
        Self::new(DEFAULT_API_URL.to_string())
    }

    /// Cap on the total time spent retrying one request.
    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = max_elapsed;
        self
    }

    async fn post_info(
        &self,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, DataSourceError> {
        let url = format!("{}/info", self.base_url);
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.max_elapsed),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .post(&url)
                .header("accept", "application/json")
                .json(&payload)
                .send()
                .await
                .map_err(|e| {
                    backoff::Error::transient(DataSourceError::NetworkError(e.to_string()))
                })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(DataSourceError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(DataSourceError::ParseError(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl DataSource for HyperliquidDataSource {
    async fn fetch_user_fills(&self, user: &str) -> Result<Vec<RawFill>, DataSourceError> {
        debug!(user = %user, "Fetching user fills");

        let response = self.post_info(user_fills_payload(user)).await?;
        let fills = parse_fills_response(response)?;

        debug!(user = %user, count = fills.len(), "Fetched user fills");
        Ok(fills)
    }
}

fn user_fills_payload(user: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "userFills",
        "user": user,
        "aggregateByTime": true
    })
}

/// Split the array body into raw payloads; field validation happens later.
fn parse_fills_response(response: serde_json::Value) -> Result<Vec<RawFill>, DataSourceError> {
    match response {
        serde_json::Value::Array(items) => Ok(items.into_iter().map(RawFill::new).collect()),
        _ => Err(DataSourceError::ParseError(
            "Expected array response".to_string(),
        )),
    }
}
