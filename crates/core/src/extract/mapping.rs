//! Loosely typed input: the JSON shape the extractor's sections serialize to,
//! as produced by older tooling or hand-written fixtures. Scalars may be
//! numbers or strings; every one goes through the normalizer.

use serde_json::{Map, Value};

use crate::domain::sections::{CompanySections, FieldMap, RawPeriod};
use crate::domain::snapshot::FinancialSnapshot;
use crate::extract::error::{isolate, SectionError};
use crate::extract::normalize::{normalize_key, normalize_value};
use crate::extract::sources;

pub const UNKNOWN_COMPANY: &str = "Unknown";

const PERIOD_LABEL_KEYS: [&str; 3] = ["quarter", "period", "label"];

/// Build a snapshot from a generic mapping. Fails only when the top level is
/// not an object; ill-shaped sections come back empty.
pub fn snapshot_from_value(value: &Value) -> Result<FinancialSnapshot, SectionError> {
    sections_from_value(value).map(sources::build_snapshot)
}

pub fn sections_from_value(value: &Value) -> Result<CompanySections, SectionError> {
    let root = value
        .as_object()
        .ok_or_else(|| SectionError::malformed("root", format!("expected an object, got {}", kind(value))))?;

    let company_name = root
        .get("company_name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN_COMPANY);

    let mut out = CompanySections::new(company_name);
    out.company_url = root
        .get("company_url")
        .and_then(Value::as_str)
        .map(str::to_string);

    if let Some(basic) = root.get("basic_data").and_then(Value::as_object) {
        out.display_name = basic
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string);
    }
    out.basic_data = isolate("basic_data", field_map("basic_data", root, &["name"]));
    out.financial_ratios = isolate("financial_ratios", field_map("financial_ratios", root, &[]));
    out.shareholding_pattern = isolate(
        "shareholding_pattern",
        field_map("shareholding_pattern", root, &[]),
    );
    out.quarterly_results = isolate("quarterly_results", periods(root));
    out.announcements = string_list(root.get("announcements"));
    out.credit_ratings = string_list(root.get("credit_ratings"));

    Ok(out)
}

fn field_map(
    section: &'static str,
    root: &Map<String, Value>,
    skip: &[&str],
) -> Result<FieldMap, SectionError> {
    let Some(value) = root.get(section) else {
        return Ok(FieldMap::new());
    };
    let obj = value
        .as_object()
        .ok_or_else(|| SectionError::malformed(section, format!("expected an object, got {}", kind(value))))?;
    Ok(normalize_object(obj, skip))
}

fn periods(root: &Map<String, Value>) -> Result<Vec<RawPeriod>, SectionError> {
    const SECTION: &str = "quarterly_results";
    let Some(value) = root.get(SECTION) else {
        return Ok(Vec::new());
    };
    let rows = value
        .as_array()
        .ok_or_else(|| SectionError::malformed(SECTION, format!("expected an array, got {}", kind(value))))?;

    Ok(rows
        .iter()
        .filter_map(Value::as_object)
        .map(|row| {
            let label = row
                .iter()
                .find(|(k, _)| PERIOD_LABEL_KEYS.contains(&normalize_key(k).as_str()))
                .and_then(|(_, v)| v.as_str())
                .unwrap_or_default()
                .to_string();
            RawPeriod {
                label,
                values: normalize_object(row, &PERIOD_LABEL_KEYS),
            }
        })
        .collect())
}

fn normalize_object(obj: &Map<String, Value>, skip: &[&str]) -> FieldMap {
    obj.iter()
        .map(|(k, v)| (normalize_key(k), v))
        .filter(|(k, _)| !k.is_empty() && !skip.contains(&k.as_str()))
        .map(|(k, v)| (k, normalize_value(v)))
        .collect()
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_the_sectioned_mapping() {
        let value = json!({
            "company_name": "TCS",
            "company_url": "https://example.test/company/TCS/",
            "basic_data": {"name": "Tata Consultancy", "Stock P/E": "28.4", "current_price": 3950.5},
            "financial_ratios": {"ROCE %": "64%", "debt_to_equity": 0},
            "shareholding_pattern": {"Promoters": "72.3"},
            "quarterly_results": [
                {"Quarter": "Dec 2024", "Sales": "63,973", "Net Profit": 12380},
                {"Quarter": "Sep 2024", "Sales": "-", "Net Profit": "11,909"}
            ],
            "announcements": ["Q3 results", ""]
        });

        let snapshot = snapshot_from_value(&value).unwrap();
        assert_eq!(snapshot.company_name, "TCS");
        assert_eq!(snapshot.sections.display_name.as_deref(), Some("Tata Consultancy"));
        assert_eq!(snapshot.overview.pe_ratio, Some(28.4));
        assert_eq!(snapshot.overview.current_price, Some(3950.5));
        assert_eq!(snapshot.ratios.roce, Some(64.0));
        assert_eq!(snapshot.ratios.debt_to_equity, Some(0.0));
        assert_eq!(snapshot.shareholding.promoter, Some(72.3));
        assert_eq!(snapshot.periods.len(), 2);
        assert_eq!(snapshot.periods[0].label, "Dec 2024");
        assert_eq!(snapshot.periods[0].metric("revenue"), Some(63973.0));
        assert_eq!(snapshot.periods[1].metric("sales"), None);
        assert_eq!(snapshot.periods[1].metric("net_profit"), Some(11909.0));
        assert_eq!(snapshot.announcements, vec!["Q3 results"]);
    }

    #[test]
    fn empty_mapping_yields_unknown_company() {
        let snapshot = snapshot_from_value(&json!({})).unwrap();
        assert_eq!(snapshot.company_name, UNKNOWN_COMPANY);
        assert!(snapshot.periods.is_empty());
        assert!(snapshot.is_not_found());
    }

    #[test]
    fn ill_shaped_sections_are_emptied() {
        let value = json!({
            "company_name": "X",
            "basic_data": [1, 2, 3],
            "quarterly_results": {"not": "a list"},
            "financial_ratios": {"roe": "17"}
        });
        let snapshot = snapshot_from_value(&value).unwrap();
        assert!(snapshot.sections.basic_data.is_empty());
        assert!(snapshot.periods.is_empty());
        assert_eq!(snapshot.ratios.roe, Some(17.0));
    }

    #[test]
    fn non_object_root_is_rejected() {
        let err = snapshot_from_value(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, SectionError::Malformed { section: "root", .. }));
    }
}
