use thiserror::Error;

use crate::analysis::scoring::CategoryScore;
use crate::domain::recommendation::Category;
use crate::extract::SectionError;

/// A sub-scorer could not evaluate one of its inputs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoringError {
    #[error("{metric} is not a finite number ({value})")]
    NonFinite { metric: &'static str, value: f64 },
}

/// Typed degradation marker for one category: the score and reasons reached
/// before the failure, plus the failure itself.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{} scoring degraded: {error}", .partial.category)]
pub struct Degraded {
    pub partial: CategoryScore,
    #[source]
    pub error: ScoringError,
}

/// Failure outside any single category. Callers of `analyze` never see this;
/// it is folded into a Hold result with zero confidence.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("unusable input: {0}")]
    Mapping(#[from] SectionError),

    #[error("{category} weight is {weight}, expected a finite non-negative number")]
    InvalidWeight { category: Category, weight: f64 },

    #[error("category weights sum to {0}, expected 1.0")]
    InvalidWeights(f64),

    #[error("overall score is not a finite number")]
    NonFiniteScore,
}
