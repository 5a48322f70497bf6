use serde_json::Value;

const CRORE: f64 = 10_000_000.0;
const LAKH: f64 = 100_000.0;

const CRORE_SUFFIXES: [&str; 2] = ["Cr.", "Cr"];
const LAKH_SUFFIX: &str = "L";

/// Parse a page token such as `₹1,234.50`, `18.5%`, `12.5Cr` or `3L`.
///
/// Returns `None` for blanks, `-`, `n/a` and anything that does not parse.
/// Non-finite results (`inf`, `NaN`) are treated as unparseable.
pub fn normalize_str(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" || trimmed.eq_ignore_ascii_case("n/a") {
        return None;
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| !matches!(c, '₹' | '$' | ',' | '%') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    for suffix in CRORE_SUFFIXES {
        if let Some(prefix) = cleaned.strip_suffix(suffix) {
            return parse_finite(prefix).map(|v| v * CRORE);
        }
    }
    if let Some(prefix) = cleaned.strip_suffix(LAKH_SUFFIX) {
        return parse_finite(prefix).map(|v| v * LAKH);
    }

    parse_finite(&cleaned)
}

/// Same contract as [`normalize_str`] for values that may already be numeric.
pub fn normalize_value(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => normalize_str(s),
        _ => None,
    }
}

/// `"Debt to equity"` -> `"debt_to_equity"`. Trailing expander markers (`+`)
/// that the site appends to row names are dropped.
pub fn normalize_key(name: &str) -> String {
    name.trim()
        .trim_end_matches('+')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blanks_and_placeholders_are_unknown() {
        assert_eq!(normalize_str(""), None);
        assert_eq!(normalize_str("   "), None);
        assert_eq!(normalize_str("-"), None);
        assert_eq!(normalize_str("N/A"), None);
        assert_eq!(normalize_str("n/a"), None);
    }

    #[test]
    fn strips_currency_grouping_and_percent() {
        assert_eq!(normalize_str("₹1,234.50"), Some(1234.50));
        assert_eq!(normalize_str("18.5 %"), Some(18.5));
        assert_eq!(normalize_str("₹ 12,34,567"), Some(1_234_567.0));
        assert_eq!(normalize_str("-3.2"), Some(-3.2));
    }

    #[test]
    fn applies_crore_and_lakh_scales() {
        assert_eq!(normalize_str("12.5Cr"), Some(125_000_000.0));
        assert_eq!(normalize_str("₹ 1,000 Cr."), Some(10_000_000_000.0));
        assert_eq!(normalize_str("3L"), Some(300_000.0));
    }

    #[test]
    fn malformed_tokens_are_unknown() {
        assert_eq!(normalize_str("abc"), None);
        assert_eq!(normalize_str("Cr"), None);
        assert_eq!(normalize_str("1,234 / 987"), None);
        assert_eq!(normalize_str("inf"), None);
        assert_eq!(normalize_str("NaN"), None);
    }

    #[test]
    fn zero_is_a_value_not_unknown() {
        assert_eq!(normalize_str("0"), Some(0.0));
        assert_eq!(normalize_str("0.00%"), Some(0.0));
    }

    #[test]
    fn accepts_already_numeric_values() {
        assert_eq!(normalize_value(&json!(18.5)), Some(18.5));
        assert_eq!(normalize_value(&json!(7)), Some(7.0));
        assert_eq!(normalize_value(&json!("2.5Cr")), Some(25_000_000.0));
        assert_eq!(normalize_value(&json!(null)), None);
        assert_eq!(normalize_value(&json!(true)), None);
        assert_eq!(normalize_value(&json!([1, 2])), None);
    }

    #[test]
    fn keys_are_lowercased_with_underscores() {
        assert_eq!(normalize_key("Debt to equity"), "debt_to_equity");
        assert_eq!(normalize_key(" Net Profit + "), "net_profit");
        assert_eq!(normalize_key("Stock P/E"), "stock_p/e");
        assert_eq!(normalize_key("ROCE %"), "roce_%");
    }
}
