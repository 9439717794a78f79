pub mod api;
pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod report;
pub mod watchlist;

pub use config::{Config, RunMode};
pub use datasource::{DataSource, DataSourceError, HyperliquidDataSource, MockDataSource};
pub use domain::{Action, Address, Coin, Decimal, Fill, RawFill, TimeMs, TradeClass};
pub use engine::{InsufficientDataWarning, PositionLedger, StatisticsSnapshot, Thresholds};
pub use error::AppError;
pub use orchestration::{Analysis, AnalysisOutcome, Analyzer, BatchReport, BatchScreener};
