use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Normalized field name to normalized value. `None` marks a field that was
/// present on the page but could not be read as a number.
pub type FieldMap = BTreeMap<String, Option<f64>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPeriod {
    pub label: String,
    pub values: FieldMap,
}

/// Per-section output of extraction, before candidate sources are resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanySections {
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub basic_data: FieldMap,
    #[serde(default)]
    pub quarterly_results: Vec<RawPeriod>,
    #[serde(default)]
    pub financial_ratios: FieldMap,
    #[serde(default)]
    pub shareholding_pattern: FieldMap,
    #[serde(default)]
    pub announcements: Vec<String>,
    #[serde(default)]
    pub credit_ratings: Vec<String>,
}

impl CompanySections {
    pub fn new(company_name: impl Into<String>) -> Self {
        Self {
            company_name: company_name.into(),
            ..Default::default()
        }
    }

    /// Names of the sections that yielded any data.
    pub fn populated_sections(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.display_name.is_some() || !self.basic_data.is_empty() {
            out.push("basic_data");
        }
        if !self.quarterly_results.is_empty() {
            out.push("quarterly_results");
        }
        if !self.financial_ratios.is_empty() {
            out.push("financial_ratios");
        }
        if !self.shareholding_pattern.is_empty() {
            out.push("shareholding_pattern");
        }
        if !self.announcements.is_empty() {
            out.push("announcements");
        }
        if !self.credit_ratings.is_empty() {
            out.push("credit_ratings");
        }
        out
    }
}
