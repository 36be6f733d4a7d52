//! Multi-month totals and period-over-period comparison for KPI cards.

use visits_core::{MetricDelta, MonthlyStat, PeriodComparison, PeriodTotals};

use crate::aggregate::round_one_decimal;

/// Sum monthly statistics whose month falls in `from..=to`.
pub fn period_totals(stats: &[MonthlyStat], from: &str, to: &str) -> PeriodTotals {
    let mut totals = PeriodTotals {
        from: from.to_string(),
        to: to.to_string(),
        ..PeriodTotals::default()
    };
    let mut weighted_age = 0.0;

    for stat in stats
        .iter()
        .filter(|stat| stat.month.as_str() >= from && stat.month.as_str() <= to)
    {
        totals.months += 1;
        totals.total_patients += stat.total_patients;
        totals.pure_first_visits += stat.pure_first_visits;
        totals.returning_first_visits += stat.returning_first_visits;
        totals.revisit_count += stat.revisit_count;
        totals.unknown_count += stat.unknown_count;
        totals.endoscopy_count += stat.endoscopy_count;
        if let Some(average) = stat.average_age {
            totals.aged_patients += stat.aged_patients;
            weighted_age += average * f64::from(stat.aged_patients);
        }
    }

    if totals.aged_patients > 0 {
        totals.average_age = Some(round_one_decimal(
            weighted_age / f64::from(totals.aged_patients),
        ));
    }
    totals
}

/// Compare `current` against `previous`.
pub fn compare_periods(current: &PeriodTotals, previous: &PeriodTotals) -> PeriodComparison {
    let average_age_delta = match (current.average_age, previous.average_age) {
        (Some(now), Some(before)) => Some(round_one_decimal(now - before)),
        _ => None,
    };

    PeriodComparison {
        total_patients: metric_delta(current.total_patients, previous.total_patients),
        pure_first_visits: metric_delta(current.pure_first_visits, previous.pure_first_visits),
        returning_first_visits: metric_delta(
            current.returning_first_visits,
            previous.returning_first_visits,
        ),
        revisit_count: metric_delta(current.revisit_count, previous.revisit_count),
        endoscopy_count: metric_delta(current.endoscopy_count, previous.endoscopy_count),
        average_age_delta,
    }
}

/// Compare two single months; a month missing from `stats` counts as empty.
pub fn compare_months(stats: &[MonthlyStat], current: &str, previous: &str) -> PeriodComparison {
    compare_periods(
        &period_totals(stats, current, current),
        &period_totals(stats, previous, previous),
    )
}

fn metric_delta(current: u32, previous: u32) -> MetricDelta {
    let delta = i64::from(current) - i64::from(previous);
    let percent_change = if previous == 0 {
        None
    } else {
        Some(round_one_decimal(delta as f64 * 100.0 / f64::from(previous)))
    };
    MetricDelta {
        current,
        previous,
        delta,
        percent_change,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(month: &str, total: u32, pure: u32, aged: u32, average: Option<f64>) -> MonthlyStat {
        MonthlyStat {
            total_patients: total,
            pure_first_visits: pure,
            revisit_count: total - pure,
            aged_patients: aged,
            average_age: average,
            ..MonthlyStat::empty(month)
        }
    }

    fn stats() -> Vec<MonthlyStat> {
        vec![
            stat("2024-12", 10, 4, 2, Some(40.0)),
            stat("2025-01", 20, 5, 1, Some(70.0)),
            stat("2025-02", 30, 15, 3, Some(30.0)),
            stat("2025-03", 5, 5, 0, None),
        ]
    }

    #[test]
    fn totals_are_inclusive_and_age_is_weighted() {
        let totals = period_totals(&stats(), "2025-01", "2025-03");
        assert_eq!(totals.months, 3);
        assert_eq!(totals.total_patients, 55);
        assert_eq!(totals.pure_first_visits, 25);
        assert_eq!(totals.revisit_count, 30);
        assert_eq!(totals.aged_patients, 4);
        assert_eq!(totals.average_age, Some(40.0));
    }

    #[test]
    fn empty_range_has_no_average() {
        let totals = period_totals(&stats(), "2026-01", "2026-12");
        assert_eq!(totals.months, 0);
        assert_eq!(totals.total_patients, 0);
        assert_eq!(totals.average_age, None);
    }

    #[test]
    fn month_over_month_comparison() {
        let comparison = compare_months(&stats(), "2025-02", "2025-01");
        assert_eq!(comparison.total_patients.delta, 10);
        assert_eq!(comparison.total_patients.percent_change, Some(50.0));
        assert_eq!(comparison.pure_first_visits.percent_change, Some(200.0));
        assert_eq!(comparison.revisit_count.delta, 0);
        assert_eq!(comparison.average_age_delta, Some(-40.0));
    }

    #[test]
    fn zero_baseline_has_no_percent_change() {
        let comparison = compare_months(&stats(), "2025-03", "2023-01");
        assert_eq!(comparison.total_patients.previous, 0);
        assert_eq!(comparison.total_patients.delta, 5);
        assert_eq!(comparison.total_patients.percent_change, None);
        assert_eq!(comparison.average_age_delta, None);
    }
}
