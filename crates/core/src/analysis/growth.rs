use crate::domain::snapshot::PeriodResult;

/// Number of most recent periods the trend looks at.
pub const GROWTH_WINDOW: usize = 4;

pub const DEFAULT_MIN_PERIODS: usize = 4;

/// Period-over-period growth over the most recent history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthTrendCalculator {
    min_periods: usize,
}

impl Default for GrowthTrendCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_PERIODS)
    }
}

impl GrowthTrendCalculator {
    pub fn new(min_periods: usize) -> Self {
        Self { min_periods }
    }

    pub fn min_periods(&self) -> usize {
        self.min_periods
    }

    /// Whether there are enough periods for trend analysis at all.
    pub fn has_history(&self, periods: &[PeriodResult]) -> bool {
        periods.len() >= self.min_periods
    }

    /// Growth in percent for `metric`, or `None` when history is too short or
    /// the trend is undefined.
    pub fn growth(&self, periods: &[PeriodResult], metric: &str) -> Option<f64> {
        if !self.has_history(periods) {
            return None;
        }
        growth_trend(periods, metric)
    }
}

/// Compare the mean of the two most recent values against the mean of the
/// two oldest values within the window (most-recent-first input).
///
/// With only two or three usable values the windows share elements.
/// Returns `None` with fewer than two values or a zero older baseline.
pub fn growth_trend(periods: &[PeriodResult], metric: &str) -> Option<f64> {
    let values: Vec<f64> = periods
        .iter()
        .take(GROWTH_WINDOW)
        .filter_map(|p| p.metric(metric))
        .filter(|v| v.is_finite())
        .collect();
    if values.len() < 2 {
        return None;
    }

    let recent = mean(&values[..2]);
    let older = mean(&values[values.len() - 2..]);
    if older == 0.0 {
        return None;
    }
    Some((recent - older) / older * 100.0)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn periods(metric: &str, values: &[Option<f64>]) -> Vec<PeriodResult> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let p = PeriodResult::new(format!("Q{i}"));
                match v {
                    Some(v) => p.with_metric(metric, *v),
                    None => p,
                }
            })
            .collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn four_quarters_compare_recent_and_older_pairs() {
        let p = periods("sales", &[Some(120.0), Some(110.0), Some(100.0), Some(90.0)]);
        let g = growth_trend(&p, "sales").unwrap();
        assert!(approx(g, 20.0 / 95.0 * 100.0), "got {g}");
        assert!((g - 21.05).abs() < 0.01);
    }

    #[test]
    fn only_first_four_periods_count() {
        let p = periods(
            "sales",
            &[Some(120.0), Some(110.0), Some(100.0), Some(90.0), Some(1.0)],
        );
        assert!(approx(growth_trend(&p, "sales").unwrap(), 20.0 / 95.0 * 100.0));
    }

    #[test]
    fn short_series_windows_overlap() {
        let two = periods("sales", &[Some(120.0), Some(100.0)]);
        assert_eq!(growth_trend(&two, "sales"), Some(0.0));

        let three = periods("sales", &[Some(130.0), Some(120.0), Some(100.0)]);
        let g = growth_trend(&three, "sales").unwrap();
        assert!(approx(g, (125.0 - 110.0) / 110.0 * 100.0));
    }

    #[test]
    fn missing_values_are_skipped() {
        let p = periods("sales", &[Some(120.0), None, Some(100.0), None]);
        assert_eq!(growth_trend(&p, "sales"), Some(0.0));

        let sparse = periods("sales", &[None, Some(100.0), None, None]);
        assert_eq!(growth_trend(&sparse, "sales"), None);
    }

    #[test]
    fn zero_older_baseline_is_undefined() {
        let p = periods("net_profit", &[Some(5.0), Some(3.0), Some(0.0), Some(0.0)]);
        assert_eq!(growth_trend(&p, "net_profit"), None);
    }

    #[test]
    fn calculator_requires_minimum_history() {
        let calc = GrowthTrendCalculator::default();
        let three = periods("sales", &[Some(130.0), Some(120.0), Some(100.0)]);
        assert!(!calc.has_history(&three));
        assert_eq!(calc.growth(&three, "sales"), None);

        let relaxed = GrowthTrendCalculator::new(2);
        assert!(relaxed.growth(&three, "sales").is_some());
    }
}
