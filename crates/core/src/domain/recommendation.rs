use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const BUY_THRESHOLD: f64 = 0.75;
const SELL_THRESHOLD: f64 = 0.35;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    Buy,
    Sell,
    Hold,
}

impl Recommendation {
    /// Step function over the overall score. Both cutoffs are inclusive.
    pub fn from_score(score: f64) -> Self {
        if score >= BUY_THRESHOLD {
            Self::Buy
        } else if score <= SELL_THRESHOLD {
            Self::Sell
        } else {
            Self::Hold
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
            Self::Hold => "Hold",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five scoring categories, in reasoning order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    FinancialHealth,
    Growth,
    Valuation,
    Profitability,
    Governance,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::FinancialHealth,
        Category::Growth,
        Category::Valuation,
        Category::Profitability,
        Category::Governance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FinancialHealth => "financial_health",
            Self::Growth => "growth",
            Self::Valuation => "valuation",
            Self::Profitability => "profitability",
            Self::Governance => "governance",
        }
    }

    /// Human-readable label used in reasoning strings.
    pub fn label(&self) -> &'static str {
        match self {
            Self::FinancialHealth => "financial health",
            Self::Growth => "growth",
            Self::Valuation => "valuation",
            Self::Profitability => "profitability",
            Self::Governance => "governance",
        }
    }

    pub fn key_metric(&self) -> &'static str {
        match self {
            Self::FinancialHealth => "financial_health_score",
            Self::Growth => "growth_score",
            Self::Valuation => "valuation_score",
            Self::Profitability => "profitability_score",
            Self::Governance => "governance_score",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of scoring one snapshot. Sub-scores and `overall` are in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub financial_health: f64,
    pub growth: f64,
    pub valuation: f64,
    pub profitability: f64,
    pub governance: f64,
    pub overall: f64,
    pub reasoning: Vec<String>,
    pub recommendation: Recommendation,
}

impl ScoreBreakdown {
    pub fn sub_score(&self, category: Category) -> f64 {
        match category {
            Category::FinancialHealth => self.financial_health,
            Category::Growth => self.growth,
            Category::Valuation => self.valuation,
            Category::Profitability => self.profitability,
            Category::Governance => self.governance,
        }
    }

    pub fn sub_scores(&self) -> [f64; 5] {
        Category::ALL.map(|c| self.sub_score(c))
    }

    /// Identical to the overall score; not a data-completeness measure.
    pub fn confidence(&self) -> f64 {
        self.overall.min(1.0)
    }

    pub fn key_metrics(&self) -> BTreeMap<String, f64> {
        let mut out = BTreeMap::new();
        out.insert("overall_score".to_string(), round2(self.overall));
        for category in Category::ALL {
            out.insert(
                category.key_metric().to_string(),
                round2(self.sub_score(category)),
            );
        }
        out
    }
}

/// Caller-facing analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRecommendation {
    pub company_name: String,
    pub recommendation: Recommendation,
    pub confidence_score: f64,
    pub reasoning: Vec<String>,
    #[serde(default)]
    pub key_metrics: BTreeMap<String, f64>,
    pub timestamp: DateTime<Utc>,
}

impl StockRecommendation {
    pub fn from_breakdown(company_name: impl Into<String>, breakdown: &ScoreBreakdown) -> Self {
        Self {
            company_name: company_name.into(),
            recommendation: breakdown.recommendation,
            confidence_score: breakdown.confidence(),
            reasoning: breakdown.reasoning.clone(),
            key_metrics: breakdown.key_metrics(),
            timestamp: Utc::now(),
        }
    }

    /// Fallback for a whole-analysis failure: Hold with zero confidence.
    pub fn failed(company_name: impl Into<String>, error: &dyn fmt::Display) -> Self {
        Self {
            company_name: company_name.into(),
            recommendation: Recommendation::Hold,
            confidence_score: 0.0,
            reasoning: vec![format!("Analysis failed: {error}")],
            key_metrics: BTreeMap::new(),
            timestamp: Utc::now(),
        }
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
