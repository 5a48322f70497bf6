use std::fmt::Write;

use stockrec_core::analysis::data_completeness;
use stockrec_core::domain::recommendation::Category;
use stockrec_core::util::{format_currency, truncate_text};
use stockrec_core::{FinancialSnapshot, StockRecommendation};

const MAX_REASON_LEN: usize = 120;

/// Category scores recovered from the rounded key metrics. A failed analysis
/// has none.
pub fn sub_scores(rec: &StockRecommendation) -> Vec<f64> {
    Category::ALL
        .iter()
        .filter_map(|c| rec.key_metrics.get(c.key_metric()).copied())
        .collect()
}

pub fn render_text(
    rec: &StockRecommendation,
    snapshot: Option<&FinancialSnapshot>,
    top: usize,
) -> String {
    let mut out = String::new();
    let completeness = data_completeness(&sub_scores(rec));

    let _ = writeln!(out, "{}: {}", rec.company_name, rec.recommendation);
    let _ = writeln!(
        out,
        "  confidence {:.2} | data completeness {:.0}%",
        rec.confidence_score,
        completeness * 100.0
    );
    if let Some(snapshot) = snapshot {
        let _ = writeln!(
            out,
            "  price {} | market cap {}",
            format_currency(snapshot.overview.current_price),
            format_currency(snapshot.overview.market_cap)
        );
    }

    let shown = rec.reasoning.len().min(top);
    for reason in rec.reasoning.iter().take(shown) {
        let _ = writeln!(out, "  - {}", truncate_text(reason, MAX_REASON_LEN));
    }
    if rec.reasoning.len() > shown {
        let _ = writeln!(out, "  ({} more)", rec.reasoning.len() - shown);
    }
    out
}
