use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::sections::CompanySections;

/// Header values: market data and valuation multiples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub market_cap: Option<f64>,
    pub current_price: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialRatios {
    pub roe: Option<f64>,
    pub roce: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub interest_coverage: Option<f64>,
    pub asset_turnover: Option<f64>,
    pub net_profit_margin: Option<f64>,
}

/// Holdings in percent units (55.0 means 55%).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Shareholding {
    pub promoter: Option<f64>,
    pub public: Option<f64>,
    pub institutional: Option<f64>,
}

/// One reporting period. Metrics that could not be read are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodResult {
    pub label: String,
    pub metrics: BTreeMap<String, f64>,
}

impl PeriodResult {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_metric(mut self, name: &str, value: f64) -> Self {
        self.metrics.insert(name.to_string(), value);
        self
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

/// Structured fundamentals for one company, built once per extraction.
///
/// Every optional value distinguishes "unknown" (`None`) from a real zero.
/// `periods` is ordered most-recent-first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    pub company_name: String,
    pub overview: Overview,
    pub ratios: FinancialRatios,
    pub shareholding: Shareholding,
    pub periods: Vec<PeriodResult>,
    pub announcements: Vec<String>,
    pub credit_ratings: Vec<String>,
    #[serde(default)]
    pub sections: CompanySections,
}

impl FinancialSnapshot {
    pub fn empty(company_name: impl Into<String>) -> Self {
        let company_name = company_name.into();
        Self {
            sections: CompanySections::new(company_name.clone()),
            company_name,
            ..Default::default()
        }
    }

    /// True when the overview section produced nothing, i.e. the page did not
    /// describe a company at all. Partial data elsewhere does not count.
    pub fn is_not_found(&self) -> bool {
        self.overview == Overview::default()
            && self.sections.display_name.is_none()
            && self.sections.basic_data.is_empty()
    }
}
