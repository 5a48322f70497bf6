//! Small helpers shared by the binaries.

const CORPORATE_SUFFIXES: [&str; 7] = [
    "Limited.", "Limited", "Ltd.", "Ltd", "Private", "Pvt.", "Pvt",
];

const CRORE: f64 = 10_000_000.0;
const LAKH: f64 = 100_000.0;

/// Trim and drop trailing corporate suffixes: `"Infosys Ltd."` -> `"Infosys"`.
pub fn normalize_company_name(name: &str) -> String {
    let mut out = name.trim();
    'strip: loop {
        for suffix in CORPORATE_SUFFIXES {
            if let Some(rest) = out.strip_suffix(suffix) {
                // Only whole words; "Reliance" keeps its letters.
                if rest.ends_with(char::is_whitespace) {
                    out = rest.trim_end();
                    continue 'strip;
                }
            }
        }
        break;
    }
    out.to_string()
}

/// Names must have at least two characters and must not be all digits.
pub fn validate_company_name(name: &str) -> bool {
    let trimmed = name.trim();
    trimmed.chars().count() >= 2 && !trimmed.chars().all(|c| c.is_ascii_digit())
}

/// Key under which a company's recommendation is cached.
pub fn cache_key(name: &str) -> String {
    normalize_company_name(name).to_lowercase()
}

/// `₹12.50 Cr`, `₹3.00 L` or `₹1,234.50`; `N/A` when unknown.
pub fn format_currency(amount: Option<f64>) -> String {
    let Some(amount) = amount else {
        return "N/A".to_string();
    };
    if amount >= CRORE {
        format!("₹{:.2} Cr", amount / CRORE)
    } else if amount >= LAKH {
        format!("₹{:.2} L", amount / LAKH)
    } else {
        format!("₹{}", group_thousands(amount))
    }
}

fn group_thousands(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, d) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*d);
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

/// Truncate to at most `max_len` characters, ending in `...` when cut.
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let keep = max_len.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

pub fn safe_divide(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        None
    } else {
        Some(numerator / denominator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_corporate_suffixes() {
        assert_eq!(normalize_company_name("  Infosys Ltd. "), "Infosys");
        assert_eq!(normalize_company_name("Tata Steel Pvt Ltd"), "Tata Steel");
        assert_eq!(normalize_company_name("HDFC Bank Limited"), "HDFC Bank");
        assert_eq!(normalize_company_name("Reliance"), "Reliance");
        assert_eq!(normalize_company_name("Ltd"), "Ltd");
    }

    #[test]
    fn validates_names() {
        assert!(validate_company_name("TCS"));
        assert!(validate_company_name("3M India"));
        assert!(!validate_company_name(" a "));
        assert!(!validate_company_name(""));
        assert!(!validate_company_name("500325"));
    }

    #[test]
    fn cache_keys_ignore_case_and_padding() {
        assert_eq!(cache_key("  Infosys "), cache_key("INFOSYS"));
        assert_eq!(cache_key("Infosys Ltd."), "infosys");
    }

    #[test]
    fn formats_indian_scales() {
        assert_eq!(format_currency(None), "N/A");
        assert_eq!(format_currency(Some(125_000_000.0)), "₹12.50 Cr");
        assert_eq!(format_currency(Some(300_000.0)), "₹3.00 L");
        assert_eq!(format_currency(Some(1234.5)), "₹1,234.50");
        assert_eq!(format_currency(Some(99_999.0)), "₹99,999.00");
        assert_eq!(format_currency(Some(12.0)), "₹12.00");
        assert_eq!(format_currency(Some(-1234.0)), "₹-1,234.00");
    }

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdefghij", 8), "abcde...");
        assert_eq!(truncate_text("₹₹₹₹₹₹", 5), "₹₹...");
    }

    #[test]
    fn division_by_zero_is_none() {
        assert_eq!(safe_divide(1.0, 0.0), None);
        assert_eq!(safe_divide(3.0, 2.0), Some(1.5));
    }
}
