use serde_json::Value;

use crate::analysis::error::{AnalysisError, Degraded};
use crate::analysis::growth::{GrowthTrendCalculator, DEFAULT_MIN_PERIODS};
use crate::analysis::scoring::{self, CategoryScore, NEUTRAL_SCORE};
use crate::config::Settings;
use crate::domain::recommendation::{Category, Recommendation, ScoreBreakdown, StockRecommendation};
use crate::domain::snapshot::FinancialSnapshot;
use crate::extract::mapping::{self, UNKNOWN_COMPANY};
use crate::util::safe_divide;

const WEIGHT_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyzerOptions {
    /// Periods of history required before growth is scored.
    pub min_periods: usize,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            min_periods: DEFAULT_MIN_PERIODS,
        }
    }
}

impl AnalyzerOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            min_periods: settings.min_quarters_for_analysis,
        }
    }
}

/// Category weights for the overall score. They must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub financial_health: f64,
    pub growth: f64,
    pub valuation: f64,
    pub profitability: f64,
    pub governance: f64,
}

impl Weights {
    pub const DEFAULT: Weights = Weights {
        financial_health: 0.30,
        growth: 0.25,
        valuation: 0.20,
        profitability: 0.15,
        governance: 0.10,
    };

    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::FinancialHealth => self.financial_health,
            Category::Growth => self.growth,
            Category::Valuation => self.valuation,
            Category::Profitability => self.profitability,
            Category::Governance => self.governance,
        }
    }

    pub fn total(&self) -> f64 {
        Category::ALL.iter().map(|c| self.get(*c)).sum()
    }

    pub fn validate(&self) -> Result<(), AnalysisError> {
        for category in Category::ALL {
            let weight = self.get(category);
            if !weight.is_finite() || weight < 0.0 {
                return Err(AnalysisError::InvalidWeight { category, weight });
            }
        }
        let total = self.total();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(AnalysisError::InvalidWeights(total));
        }
        Ok(())
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Stateless scoring engine. Safe to share between concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    options: AnalyzerOptions,
    weights: Weights,
}

impl Analyzer {
    pub fn new(options: AnalyzerOptions) -> Self {
        Self {
            options,
            weights: Weights::DEFAULT,
        }
    }

    pub fn with_weights(mut self, weights: Weights) -> Self {
        self.weights = weights;
        self
    }

    pub fn options(&self) -> AnalyzerOptions {
        self.options
    }

    /// Score one snapshot. Category failures are absorbed here; only failures
    /// of the aggregation itself are returned.
    pub fn score(&self, snapshot: &FinancialSnapshot) -> Result<ScoreBreakdown, AnalysisError> {
        self.weights.validate()?;

        let calculator = GrowthTrendCalculator::new(self.options.min_periods);
        let [financial_health, growth, valuation, profitability, governance] = [
            scoring::financial_health(snapshot),
            scoring::growth(snapshot, &calculator),
            scoring::valuation(snapshot),
            scoring::profitability(snapshot),
            scoring::governance(snapshot),
        ]
        .map(|result| settle(&snapshot.company_name, result));

        let categories = [
            &financial_health,
            &growth,
            &valuation,
            &profitability,
            &governance,
        ];
        let overall: f64 = categories
            .iter()
            .map(|c| c.score * self.weights.get(c.category))
            .sum();
        if !overall.is_finite() {
            return Err(AnalysisError::NonFiniteScore);
        }
        let reasoning = categories
            .iter()
            .flat_map(|c| c.reasons.iter().cloned())
            .collect();

        Ok(ScoreBreakdown {
            financial_health: financial_health.score,
            growth: growth.score,
            valuation: valuation.score,
            profitability: profitability.score,
            governance: governance.score,
            overall,
            reasoning,
            recommendation: Recommendation::from_score(overall),
        })
    }

    /// Never fails: a whole-analysis failure becomes Hold with zero confidence.
    pub fn analyze(&self, snapshot: &FinancialSnapshot) -> StockRecommendation {
        match self.score(snapshot) {
            Ok(breakdown) => StockRecommendation::from_breakdown(&snapshot.company_name, &breakdown),
            Err(err) => {
                tracing::error!(company = %snapshot.company_name, error = %err, "analysis failed");
                StockRecommendation::failed(&snapshot.company_name, &err)
            }
        }
    }

    /// Analyze a loosely typed mapping with the extractor's section keys.
    pub fn analyze_value(&self, value: &Value) -> StockRecommendation {
        match mapping::snapshot_from_value(value) {
            Ok(snapshot) => self.analyze(&snapshot),
            Err(err) => {
                let err = AnalysisError::from(err);
                let company = value
                    .get("company_name")
                    .and_then(Value::as_str)
                    .unwrap_or(UNKNOWN_COMPANY);
                tracing::error!(company, error = %err, "analysis failed");
                StockRecommendation::failed(company, &err)
            }
        }
    }
}

fn settle(company: &str, result: Result<CategoryScore, Degraded>) -> CategoryScore {
    match result {
        Ok(score) => score,
        Err(Degraded { mut partial, error }) => {
            tracing::warn!(
                company,
                category = %partial.category,
                error = %error,
                "sub-score degraded; keeping partial score"
            );
            partial
                .reasons
                .push(format!("Limited {} data available", partial.category.label()));
            partial
        }
    }
}

/// Fraction of category scores that moved away from neutral.
///
/// A rough measure of how much of the snapshot was actually usable. It is not
/// part of the confidence score.
pub fn data_completeness(sub_scores: &[f64]) -> f64 {
    let informative = sub_scores
        .iter()
        .filter(|s| (**s - NEUTRAL_SCORE).abs() > f64::EPSILON)
        .count();
    safe_divide(informative as f64, sub_scores.len() as f64).unwrap_or(0.0)
}

pub fn analyze(snapshot: &FinancialSnapshot) -> StockRecommendation {
    Analyzer::default().analyze(snapshot)
}

pub fn analyze_value(value: &Value) -> StockRecommendation {
    Analyzer::default().analyze_value(value)
}
