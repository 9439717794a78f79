//! Data source abstraction for fetching a user's fill history.

use crate::domain::RawFill;
use async_trait::async_trait;
use std::fmt;

pub mod hyperliquid;
pub mod mock;

pub use hyperliquid::HyperliquidDataSource;
pub use mock::MockDataSource;

/// Data source trait for fetching fills.
///
/// Implementations handle retry/backoff and rate limiting.
#[async_trait]
pub trait DataSource: Send + Sync + fmt::Debug {
    /// Fetch the full fill history for a user.
    ///
    /// Payloads are returned as the venue sent them, in venue order.
    async fn fetch_user_fills(&self, user: &str) -> Result<Vec<RawFill>, DataSourceError>;
}

/// Transport-level failure while talking to the venue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSourceError {
    /// Network error (e.g., connection timeout, DNS failure)
    NetworkError(String),
    /// Non-2xx response
    HttpError { status: u16, message: String },
    /// Invalid JSON or unexpected response shape
    ParseError(String),
    /// Rate limit exceeded after retries
    RateLimited,
}

impl fmt::Display for DataSourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSourceError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            DataSourceError::HttpError { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            DataSourceError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            DataSourceError::RateLimited => write!(f, "Rate limited"),
        }
    }
}

impl std::error::Error for DataSourceError {}
