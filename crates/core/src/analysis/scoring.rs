//! The five category scorers.
//!
//! Every scorer starts at the neutral score, applies independent threshold
//! rules to the fields it owns and clamps the result to [0, 1]. Unknown
//! fields are skipped without a reason. Each rule that fires appends exactly
//! one reason.

use serde::{Deserialize, Serialize};

use crate::analysis::error::{Degraded, ScoringError};
use crate::analysis::growth::GrowthTrendCalculator;
use crate::domain::recommendation::Category;
use crate::domain::snapshot::FinancialSnapshot;

pub const NEUTRAL_SCORE: f64 = 0.5;

pub const INSUFFICIENT_GROWTH_HISTORY: &str =
    "Insufficient quarterly data for growth trend analysis";

/// Metric names read from each period by the growth scorer.
pub const REVENUE_METRIC: &str = "revenue";
pub const PROFIT_METRIC: &str = "net_profit";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: Category,
    pub score: f64,
    pub reasons: Vec<String>,
}

/// Running score for one category.
struct Tally {
    category: Category,
    score: f64,
    reasons: Vec<String>,
}

impl Tally {
    fn new(category: Category) -> Self {
        Self {
            category,
            score: NEUTRAL_SCORE,
            reasons: Vec::new(),
        }
    }

    fn adjust(&mut self, delta: f64, reason: String) {
        self.score += delta;
        self.reasons.push(reason);
    }

    fn note(&mut self, reason: &str) {
        self.reasons.push(reason.to_string());
    }

    fn finish(self) -> CategoryScore {
        CategoryScore {
            category: self.category,
            score: self.score.clamp(0.0, 1.0),
            reasons: self.reasons,
        }
    }
}

fn score_with(
    category: Category,
    rules: impl FnOnce(&mut Tally) -> Result<(), ScoringError>,
) -> Result<CategoryScore, Degraded> {
    let mut tally = Tally::new(category);
    match rules(&mut tally) {
        Ok(()) => Ok(tally.finish()),
        Err(error) => Err(Degraded {
            partial: tally.finish(),
            error,
        }),
    }
}

/// Unknown stays unknown; a known value must be finite to be scored.
fn known(metric: &'static str, value: Option<f64>) -> Result<Option<f64>, ScoringError> {
    match value {
        Some(v) if !v.is_finite() => Err(ScoringError::NonFinite { metric, value: v }),
        other => Ok(other),
    }
}

pub fn financial_health(snapshot: &FinancialSnapshot) -> Result<CategoryScore, Degraded> {
    let ratios = &snapshot.ratios;
    score_with(Category::FinancialHealth, |t| {
        if let Some(de) = known("debt_to_equity", ratios.debt_to_equity)? {
            if de < 0.5 {
                t.adjust(
                    0.15,
                    format!("Low debt-to-equity ratio of {de:.2} indicates strong financial position"),
                );
            } else if de > 1.0 {
                t.adjust(
                    -0.15,
                    format!("High debt-to-equity ratio of {de:.2} raises concerns about financial stability"),
                );
            }
        }

        if let Some(cr) = known("current_ratio", ratios.current_ratio)? {
            if cr > 1.5 {
                t.adjust(0.10, format!("Good current ratio of {cr:.2} indicates healthy liquidity"));
            } else if cr < 1.0 {
                t.adjust(
                    -0.10,
                    format!("Low current ratio of {cr:.2} may indicate liquidity concerns"),
                );
            }
        }

        if let Some(ic) = known("interest_coverage", ratios.interest_coverage)? {
            if ic > 5.0 {
                t.adjust(
                    0.10,
                    format!("Strong interest coverage of {ic:.1}x indicates ability to service debt"),
                );
            } else if ic < 2.0 {
                t.adjust(
                    -0.15,
                    format!("Weak interest coverage of {ic:.1}x raises debt servicing concerns"),
                );
            }
        }
        Ok(())
    })
}

pub fn growth(
    snapshot: &FinancialSnapshot,
    calculator: &GrowthTrendCalculator,
) -> Result<CategoryScore, Degraded> {
    let periods = &snapshot.periods;
    score_with(Category::Growth, |t| {
        if !calculator.has_history(periods) {
            t.note(INSUFFICIENT_GROWTH_HISTORY);
            return Ok(());
        }

        if let Some(g) = known("revenue_growth", calculator.growth(periods, REVENUE_METRIC))? {
            if g > 15.0 {
                t.adjust(0.20, format!("Strong revenue growth of {g:.1}%"));
            } else if g > 5.0 {
                t.adjust(0.10, format!("Moderate revenue growth of {g:.1}%"));
            } else if g < -5.0 {
                t.adjust(-0.15, format!("Declining revenue trend of {g:.1}%"));
            }
        }

        if let Some(g) = known("profit_growth", calculator.growth(periods, PROFIT_METRIC))? {
            if g > 20.0 {
                t.adjust(0.15, format!("Excellent profit growth of {g:.1}%"));
            } else if g > 10.0 {
                t.adjust(0.10, format!("Good profit growth of {g:.1}%"));
            } else if g < -10.0 {
                t.adjust(-0.20, format!("Concerning profit decline of {g:.1}%"));
            }
        }
        Ok(())
    })
}

pub fn valuation(snapshot: &FinancialSnapshot) -> Result<CategoryScore, Degraded> {
    let overview = &snapshot.overview;
    score_with(Category::Valuation, |t| {
        // Non-positive multiples (loss-making or negative book) are not scored.
        if let Some(pe) = known("pe_ratio", overview.pe_ratio)?.filter(|v| *v > 0.0) {
            if pe < 15.0 {
                t.adjust(0.15, format!("Attractive P/E ratio of {pe:.1}"));
            } else if pe < 25.0 {
                t.adjust(0.05, format!("Reasonable P/E ratio of {pe:.1}"));
            } else if pe > 40.0 {
                t.adjust(
                    -0.10,
                    format!("High P/E ratio of {pe:.1} may indicate overvaluation"),
                );
            }
        }

        if let Some(pb) = known("pb_ratio", overview.pb_ratio)?.filter(|v| *v > 0.0) {
            if pb < 1.5 {
                t.adjust(0.10, format!("Attractive P/B ratio of {pb:.1}"));
            } else if pb > 3.0 {
                t.adjust(-0.05, format!("High P/B ratio of {pb:.1}"));
            }
        }

        if let Some(dy) = known("dividend_yield", overview.dividend_yield)? {
            if dy > 2.0 {
                t.adjust(0.05, format!("Good dividend yield of {dy:.1}%"));
            }
        }
        Ok(())
    })
}

pub fn profitability(snapshot: &FinancialSnapshot) -> Result<CategoryScore, Degraded> {
    let ratios = &snapshot.ratios;
    score_with(Category::Profitability, |t| {
        if let Some(roe) = known("roe", ratios.roe)? {
            if roe > 20.0 {
                t.adjust(0.20, format!("Excellent ROE of {roe:.1}%"));
            } else if roe > 15.0 {
                t.adjust(0.15, format!("Good ROE of {roe:.1}%"));
            } else if roe < 10.0 {
                t.adjust(-0.10, format!("Below average ROE of {roe:.1}%"));
            }
        }

        if let Some(roce) = known("roce", ratios.roce)? {
            if roce > 20.0 {
                t.adjust(0.15, format!("Strong ROCE of {roce:.1}%"));
            } else if roce > 15.0 {
                t.adjust(0.10, format!("Good ROCE of {roce:.1}%"));
            } else if roce < 10.0 {
                t.adjust(-0.10, format!("Low ROCE of {roce:.1}%"));
            }
        }

        if let Some(margin) = known("net_profit_margin", ratios.net_profit_margin)? {
            if margin > 15.0 {
                t.adjust(0.10, format!("High profit margin of {margin:.1}%"));
            } else if margin < 5.0 {
                t.adjust(-0.05, format!("Low profit margin of {margin:.1}%"));
            }
        }
        Ok(())
    })
}

pub fn governance(snapshot: &FinancialSnapshot) -> Result<CategoryScore, Degraded> {
    let holding = &snapshot.shareholding;
    score_with(Category::Governance, |t| {
        if let Some(p) = known("promoter_holding", holding.promoter)? {
            if (40.0..=75.0).contains(&p) {
                t.adjust(0.10, format!("Healthy promoter holding of {p:.1}%"));
            } else if p > 80.0 {
                t.adjust(
                    -0.05,
                    format!("Very high promoter holding of {p:.1}% may limit liquidity"),
                );
            } else if p < 25.0 {
                t.adjust(
                    -0.10,
                    format!("Low promoter holding of {p:.1}% may indicate lack of confidence"),
                );
            }
        }

        if let Some(inst) = known("institutional_holding", holding.institutional)? {
            if inst > 20.0 {
                t.adjust(0.05, format!("Good institutional holding of {inst:.1}%"));
            }
        }
        Ok(())
    })
}
