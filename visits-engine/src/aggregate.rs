//! Monthly statistics and age-band distributions.

use std::collections::BTreeMap;

use visits_core::{
    AgeBand, AgeBandCount, ClassifiedVisitRecord, ClassifierConfig, MonthlyAgeBands, MonthlyStat,
    VisitCategory, VisitRecord,
};

use crate::age::record_age;
use crate::department::DepartmentMatcher;

#[derive(Default)]
struct MonthAccumulator {
    stat: MonthlyStat,
    age_sum: u64,
}

impl MonthAccumulator {
    fn push(&mut self, visit: &ClassifiedVisitRecord, endoscopy: bool) {
        self.stat.total_patients += 1;
        match visit.category {
            VisitCategory::PureFirst => self.stat.pure_first_visits += 1,
            VisitCategory::ReturningFirst => self.stat.returning_first_visits += 1,
            VisitCategory::Revisit => self.stat.revisit_count += 1,
            VisitCategory::Unknown => self.stat.unknown_count += 1,
        }
        if endoscopy {
            self.stat.endoscopy_count += 1;
        }
        if let Some(age) = visit.age {
            self.age_sum += u64::from(age);
            self.stat.aged_patients += 1;
        }
    }

    fn finalize(mut self, month: String) -> MonthlyStat {
        self.stat.month = month;
        self.stat.average_age = if self.stat.aged_patients > 0 {
            Some(round_one_decimal(
                self.age_sum as f64 / f64::from(self.stat.aged_patients),
            ))
        } else {
            None
        };
        self.stat
    }
}

/// Fold classified visits into per-month statistics, months ascending.
pub fn aggregate_monthly(
    classified: &[ClassifiedVisitRecord],
    config: &ClassifierConfig,
) -> Vec<MonthlyStat> {
    let departments = DepartmentMatcher::new(config);
    let mut months: BTreeMap<String, MonthAccumulator> = BTreeMap::new();

    for visit in classified {
        let endoscopy = departments.is_endoscopy(visit.record.department.as_deref());
        months
            .entry(visit.record.month_bucket())
            .or_default()
            .push(visit, endoscopy);
    }

    months
        .into_iter()
        .map(|(month, acc)| acc.finalize(month))
        .collect()
}

pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Count of records per age band, all bands in display order.
pub fn age_band_distribution(
    records: &[VisitRecord],
    config: &ClassifierConfig,
) -> Vec<AgeBandCount> {
    count_bands(
        records
            .iter()
            .map(|record| record_age(record, config.max_valid_age)),
    )
}

/// Age-band distribution per month, months ascending.
pub fn monthly_age_bands(
    records: &[VisitRecord],
    config: &ClassifierConfig,
) -> Vec<MonthlyAgeBands> {
    let mut months: BTreeMap<String, Vec<Option<u32>>> = BTreeMap::new();
    for record in records {
        months
            .entry(record.month_bucket())
            .or_default()
            .push(record_age(record, config.max_valid_age));
    }

    months
        .into_iter()
        .map(|(month, ages)| MonthlyAgeBands {
            month,
            bands: count_bands(ages.into_iter()),
        })
        .collect()
}

fn count_bands(ages: impl Iterator<Item = Option<u32>>) -> Vec<AgeBandCount> {
    let mut counts: BTreeMap<AgeBand, u32> = BTreeMap::new();
    for age in ages {
        *counts.entry(AgeBand::from_age(age)).or_insert(0) += 1;
    }

    AgeBand::ALL
        .iter()
        .map(|band| AgeBandCount {
            band: *band,
            count: counts.get(band).copied().unwrap_or(0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use visits_core::VisitType;

    fn classified(
        date: &str,
        category: VisitCategory,
        age: Option<u32>,
        department: Option<&str>,
    ) -> ClassifiedVisitRecord {
        let mut record = VisitRecord::new(date, VisitType::Unknown);
        record.department = department.map(str::to_string);
        ClassifiedVisitRecord {
            record,
            category,
            age,
        }
    }

    #[test]
    fn counts_categories_endoscopy_and_age() {
        let visits = vec![
            classified(
                "2025-01-02",
                VisitCategory::PureFirst,
                Some(30),
                Some("Endoscopy Center"),
            ),
            classified("2025-01-05", VisitCategory::Revisit, Some(41), None),
            classified(
                "2025-01-09",
                VisitCategory::Unknown,
                None,
                Some("Internal Medicine"),
            ),
            classified(
                "2025-02-01",
                VisitCategory::ReturningFirst,
                None,
                Some("COLONOSCOPY"),
            ),
        ];
        let stats = aggregate_monthly(&visits, &ClassifierConfig::default());
        assert_eq!(stats.len(), 2);

        let january = &stats[0];
        assert_eq!(january.month, "2025-01");
        assert_eq!(january.total_patients, 3);
        assert_eq!(january.pure_first_visits, 1);
        assert_eq!(january.revisit_count, 1);
        assert_eq!(january.unknown_count, 1);
        assert_eq!(january.endoscopy_count, 1);
        assert_eq!(january.aged_patients, 2);
        assert_eq!(january.average_age, Some(35.5));

        let february = &stats[1];
        assert_eq!(february.returning_first_visits, 1);
        assert_eq!(february.endoscopy_count, 1);
        assert_eq!(february.average_age, None);
    }

    #[test]
    fn average_age_rounds_to_one_decimal() {
        let visits = vec![
            classified("2025-03-01", VisitCategory::Revisit, Some(30), None),
            classified("2025-03-02", VisitCategory::Revisit, Some(31), None),
            classified("2025-03-03", VisitCategory::Revisit, Some(31), None),
        ];
        let stats = aggregate_monthly(&visits, &ClassifierConfig::default());
        assert_eq!(stats[0].average_age, Some(30.7));
    }

    #[test]
    fn band_distribution_lists_every_band() {
        let records = vec![
            VisitRecord::new("2025-01-10", VisitType::FirstVisit).with_birth_date("2010-01-01"),
            VisitRecord::new("2025-01-10", VisitType::FirstVisit).with_birth_date("1940-01-01"),
            VisitRecord::new("2025-02-10", VisitType::FirstVisit).with_birth_date("1995-03-01"),
            VisitRecord::new("2025-02-10", VisitType::FirstVisit),
        ];
        let bands = age_band_distribution(&records, &ClassifierConfig::default());
        assert_eq!(bands.len(), AgeBand::ALL.len());
        let count = |band: AgeBand| bands.iter().find(|b| b.band == band).unwrap().count;
        assert_eq!(count(AgeBand::Under20), 1);
        assert_eq!(count(AgeBand::Twenties), 1);
        assert_eq!(count(AgeBand::EightyPlus), 1);
        assert_eq!(count(AgeBand::Unknown), 1);
        assert_eq!(count(AgeBand::Fifties), 0);

        let monthly = monthly_age_bands(&records, &ClassifierConfig::default());
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[1].month, "2025-02");
        assert_eq!(monthly[1].bands.iter().map(|b| b.count).sum::<u32>(), 2);
    }

    #[test]
    fn no_records_no_months() {
        assert!(aggregate_monthly(&[], &ClassifierConfig::default()).is_empty());
        assert!(age_band_distribution(&[], &ClassifierConfig::default())
            .iter()
            .all(|band| band.count == 0));
    }
}
