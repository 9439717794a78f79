pub mod analyzer;
pub mod batch;

pub use analyzer::{analyze_fills, Analysis, AnalysisError, AnalysisOutcome, Analyzer, FillCounts};
pub use batch::{BatchEntry, BatchReport, BatchScreener, ScreenStatus};
