//! Ordered candidate sources per logical metric.
//!
//! The site reports the same figure under different names and in different
//! sections. Each metric lists where to look, in order; the first candidate
//! that holds a known value wins, so a real zero is never skipped in favour
//! of a later candidate.

use crate::domain::sections::{CompanySections, FieldMap, RawPeriod};
use crate::domain::snapshot::{
    FinancialRatios, FinancialSnapshot, Overview, PeriodResult, Shareholding,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Overview,
    Ratios,
    Shareholding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    Field(Section, &'static str),
    /// Sum of several fields, only when every one of them is known.
    Sum(Section, &'static [&'static str]),
}

use FieldSource::{Field, Sum};
use Section::{Overview as Ov, Ratios as Ra, Shareholding as Sh};

pub const MARKET_CAP: &[FieldSource] = &[Field(Ov, "market_cap")];
pub const CURRENT_PRICE: &[FieldSource] = &[Field(Ov, "current_price")];
pub const PE_RATIO: &[FieldSource] = &[
    Field(Ov, "price_earnings"),
    Field(Ov, "pe_ratio"),
    Field(Ov, "stock_p/e"),
];
pub const PB_RATIO: &[FieldSource] = &[Field(Ov, "price_to_book"), Field(Ov, "pb_ratio")];
pub const DIVIDEND_YIELD: &[FieldSource] = &[Field(Ov, "dividend_yield")];

pub const ROE: &[FieldSource] = &[Field(Ra, "roe"), Field(Ra, "roe_%"), Field(Ov, "roe")];
pub const ROCE: &[FieldSource] = &[Field(Ra, "roce"), Field(Ra, "roce_%"), Field(Ov, "roce")];
pub const DEBT_TO_EQUITY: &[FieldSource] =
    &[Field(Ra, "debt_to_equity"), Field(Ov, "debt_to_equity")];
pub const CURRENT_RATIO: &[FieldSource] =
    &[Field(Ra, "current_ratio"), Field(Ov, "current_ratio")];
pub const INTEREST_COVERAGE: &[FieldSource] = &[
    Field(Ra, "interest_coverage"),
    Field(Ov, "interest_coverage"),
];
pub const ASSET_TURNOVER: &[FieldSource] = &[Field(Ra, "asset_turnover")];
pub const NET_PROFIT_MARGIN: &[FieldSource] = &[
    Field(Ra, "net_profit_margin"),
    Field(Ov, "net_profit_margin"),
];

pub const PROMOTER_HOLDING: &[FieldSource] =
    &[Field(Sh, "promoters"), Field(Sh, "promoter_holding")];
pub const PUBLIC_HOLDING: &[FieldSource] = &[Field(Sh, "public"), Field(Sh, "public_holding")];
pub const INSTITUTIONAL_HOLDING: &[FieldSource] = &[
    Field(Sh, "institutional_investors"),
    Field(Sh, "institutional_holding"),
    Sum(Sh, &["fiis", "diis"]),
];

/// Canonical period metric names and the headers they may be read from.
const PERIOD_ALIASES: &[(&str, &[&str])] = &[
    ("revenue", &["sales", "revenue"]),
    ("eps", &["eps_in_rs", "eps"]),
];

impl FieldSource {
    pub fn resolve(&self, sections: &CompanySections) -> Option<f64> {
        match *self {
            Field(section, key) => lookup(section_map(sections, section), key),
            Sum(section, keys) => {
                let map = section_map(sections, section);
                keys.iter().map(|k| lookup(map, k)).sum::<Option<f64>>()
            }
        }
    }
}

pub fn resolve(sections: &CompanySections, candidates: &[FieldSource]) -> Option<f64> {
    candidates.iter().find_map(|c| c.resolve(sections))
}

/// Resolve every logical metric once and build the immutable snapshot.
pub fn build_snapshot(sections: CompanySections) -> FinancialSnapshot {
    let r = |candidates: &[FieldSource]| resolve(&sections, candidates);

    let overview = Overview {
        market_cap: r(MARKET_CAP),
        current_price: r(CURRENT_PRICE),
        pe_ratio: r(PE_RATIO),
        pb_ratio: r(PB_RATIO),
        dividend_yield: r(DIVIDEND_YIELD),
    };
    let ratios = FinancialRatios {
        roe: r(ROE),
        roce: r(ROCE),
        debt_to_equity: r(DEBT_TO_EQUITY),
        current_ratio: r(CURRENT_RATIO),
        interest_coverage: r(INTEREST_COVERAGE),
        asset_turnover: r(ASSET_TURNOVER),
        net_profit_margin: r(NET_PROFIT_MARGIN),
    };
    let shareholding = Shareholding {
        promoter: r(PROMOTER_HOLDING),
        public: r(PUBLIC_HOLDING),
        institutional: r(INSTITUTIONAL_HOLDING),
    };
    let periods = sections.quarterly_results.iter().map(build_period).collect();

    FinancialSnapshot {
        company_name: sections.company_name.clone(),
        overview,
        ratios,
        shareholding,
        periods,
        announcements: sections.announcements.clone(),
        credit_ratings: sections.credit_ratings.clone(),
        sections,
    }
}

fn build_period(raw: &RawPeriod) -> PeriodResult {
    let mut period = PeriodResult::new(raw.label.clone());
    for (key, value) in &raw.values {
        if let Some(v) = value {
            period.metrics.insert(key.clone(), *v);
        }
    }
    for (canonical, headers) in PERIOD_ALIASES {
        if period.metrics.contains_key(*canonical) {
            continue;
        }
        if let Some(v) = headers.iter().find_map(|h| period.metric(h)) {
            period.metrics.insert((*canonical).to_string(), v);
        }
    }
    period
}

fn section_map(sections: &CompanySections, section: Section) -> &FieldMap {
    match section {
        Section::Overview => &sections.basic_data,
        Section::Ratios => &sections.financial_ratios,
        Section::Shareholding => &sections.shareholding_pattern,
    }
}

fn lookup(map: &FieldMap, key: &str) -> Option<f64> {
    map.get(key).copied().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sections() -> CompanySections {
        CompanySections::new("Acme")
    }

    #[test]
    fn first_known_candidate_wins() {
        let mut s = sections();
        s.basic_data.insert("roe".to_string(), Some(12.0));
        s.financial_ratios.insert("roe".to_string(), Some(18.0));
        assert_eq!(resolve(&s, ROE), Some(18.0));
    }

    #[test]
    fn known_zero_is_not_skipped() {
        let mut s = sections();
        s.financial_ratios.insert("debt_to_equity".to_string(), Some(0.0));
        s.basic_data.insert("debt_to_equity".to_string(), Some(1.4));
        assert_eq!(resolve(&s, DEBT_TO_EQUITY), Some(0.0));
    }

    #[test]
    fn unreadable_candidate_falls_through() {
        let mut s = sections();
        s.financial_ratios.insert("roce".to_string(), None);
        s.basic_data.insert("roce".to_string(), Some(21.0));
        assert_eq!(resolve(&s, ROCE), Some(21.0));
    }

    #[test]
    fn institutional_sum_needs_both_parts() {
        let mut s = sections();
        s.shareholding_pattern.insert("fiis".to_string(), Some(20.0));
        assert_eq!(resolve(&s, INSTITUTIONAL_HOLDING), None);
        s.shareholding_pattern.insert("diis".to_string(), Some(5.0));
        assert_eq!(resolve(&s, INSTITUTIONAL_HOLDING), Some(25.0));
        s.shareholding_pattern
            .insert("institutional_holding".to_string(), Some(31.0));
        assert_eq!(resolve(&s, INSTITUTIONAL_HOLDING), Some(31.0));
    }

    #[test]
    fn periods_gain_canonical_aliases_and_drop_unknowns() {
        let mut s = sections();
        let mut values = FieldMap::new();
        values.insert("sales".to_string(), Some(120.0));
        values.insert("net_profit".to_string(), None);
        values.insert("eps_in_rs".to_string(), Some(4.2));
        s.quarterly_results.push(RawPeriod {
            label: "Dec 2024".to_string(),
            values,
        });

        let snapshot = build_snapshot(s);
        let period = &snapshot.periods[0];
        assert_eq!(period.label, "Dec 2024");
        assert_eq!(period.metric("sales"), Some(120.0));
        assert_eq!(period.metric("revenue"), Some(120.0));
        assert_eq!(period.metric("eps"), Some(4.2));
        assert_eq!(period.metric("net_profit"), None);
    }
}
