//! Month bucketing and chronological ordering.

use std::collections::BTreeMap;

use chrono::{Months, NaiveDate};
use visits_core::VisitRecord;

/// Records grouped by "YYYY-MM", months ascending.
///
/// Within a month records are ordered by `date_iso`; same-day records keep
/// their input order (the sort is stable).
#[derive(Debug, Default)]
pub struct MonthPartitions<'a> {
    months: BTreeMap<String, Vec<&'a VisitRecord>>,
}

impl<'a> MonthPartitions<'a> {
    pub fn new(records: &'a [VisitRecord]) -> Self {
        let mut months: BTreeMap<String, Vec<&'a VisitRecord>> = BTreeMap::new();
        for record in records {
            months.entry(record.month_bucket()).or_default().push(record);
        }
        for bucket in months.values_mut() {
            bucket.sort_by(|a, b| a.date_iso.trim().cmp(b.date_iso.trim()));
        }
        Self { months }
    }

    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    pub fn len(&self) -> usize {
        self.months.len()
    }

    pub fn month_keys(&self) -> impl Iterator<Item = &str> {
        self.months.keys().map(String::as_str)
    }

    pub fn get(&self, month: &str) -> Option<&[&'a VisitRecord]> {
        self.months.get(month).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[&'a VisitRecord])> {
        self.months
            .iter()
            .map(|(month, records)| (month.as_str(), records.as_slice()))
    }
}

/// The calendar month immediately before `month`, or `None` when the key is
/// not a valid "YYYY-MM".
pub fn previous_month_key(month: &str) -> Option<String> {
    let first_day = NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d").ok()?;
    first_day
        .checked_sub_months(Months::new(1))
        .map(|date| date.format("%Y-%m").to_string())
}
