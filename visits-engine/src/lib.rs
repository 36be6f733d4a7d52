//! Visit classification and monthly aggregation for clinic analytics.
//!
//! The whole computation is a single pure call:
//! records → partitioned by month → classified in chronological replay →
//! aggregated into monthly statistics.

mod age;
mod aggregate;
mod classify;
mod department;
mod fingerprint;
mod identity;
mod partition;
mod period;

pub use age::{age_at_visit, record_age};
pub use aggregate::{aggregate_monthly, age_band_distribution, monthly_age_bands};
pub use classify::{classify_visits, VisitClassifier};
pub use department::{normalize_label, DepartmentFlags, DepartmentMatcher};
pub use fingerprint::dataset_fingerprint;
pub use identity::{identity_key, IdentityKey, IdentityMemo, PreviousMonthWindow};
pub use partition::{previous_month_key, MonthPartitions};
pub use period::{compare_months, compare_periods, period_totals};

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use visits_core::{AnalyticsError, AnalyticsReport, ClassifierConfig, VisitRecord};

/// Classify every record and roll the result into monthly statistics.
///
/// Total for any input, including an empty slice.
pub fn analyze_records(records: &[VisitRecord], config: &ClassifierConfig) -> AnalyticsReport {
    let classified = classify_visits(records, config);
    let monthly = aggregate_monthly(&classified, config);
    debug!(
        visits = classified.len(),
        months = monthly.len(),
        "analysis finished"
    );
    AnalyticsReport {
        classified,
        monthly,
    }
}

/// Analyze records from a JSON string.
pub fn analyze_records_str(
    records_json: &str,
    config: &ClassifierConfig,
) -> Result<AnalyticsReport, AnalyticsError> {
    let value: Value =
        serde_json::from_str(records_json).map_err(|err| AnalyticsError::Parse(err.to_string()))?;
    analyze_records_value(&value, config)
}

/// Analyze records from a `serde_json::Value`.
pub fn analyze_records_value(
    value: &Value,
    config: &ClassifierConfig,
) -> Result<AnalyticsReport, AnalyticsError> {
    let records = records_from_value(value)?;
    Ok(analyze_records(&records, config))
}

/// Accepts either a bare array of records or an object with a `records` array.
pub fn records_from_value(value: &Value) -> Result<Vec<VisitRecord>, AnalyticsError> {
    let entries = value
        .as_array()
        .or_else(|| value.get("records").and_then(Value::as_array))
        .ok_or(AnalyticsError::MissingData)?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            VisitRecord::deserialize(entry)
                .map_err(|err| AnalyticsError::Parse(format!("record {index}: {err}")))
        })
        .collect()
}
