pub mod engine;
pub mod error;
pub mod growth;
pub mod scoring;

pub use engine::{analyze, analyze_value, data_completeness, Analyzer, AnalyzerOptions, Weights};
pub use error::{AnalysisError, Degraded, ScoringError};
pub use growth::{growth_trend, GrowthTrendCalculator};
pub use scoring::CategoryScore;
