//! Visit classification over a chronological replay of all months.

use tracing::{debug, trace};
use visits_core::{ClassifiedVisitRecord, ClassifierConfig, VisitCategory, VisitRecord, VisitType};

use crate::age::record_age;
use crate::department::DepartmentMatcher;
use crate::identity::{identity_key, IdentityKey, IdentityMemo, PreviousMonthWindow};
use crate::partition::{previous_month_key, MonthPartitions};

/// Applies the department, identity and number-proximity rules to one record.
#[derive(Debug, Clone)]
pub struct VisitClassifier {
    departments: DepartmentMatcher,
    number_window: i64,
}

impl VisitClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            departments: DepartmentMatcher::new(config),
            number_window: config.number_window,
        }
    }

    /// Classify `record`, then record its identity key in `memo`.
    ///
    /// The key is looked up before the decision and inserted after it, so a
    /// later record of the same patient in the same month sees it as known.
    pub fn classify(
        &self,
        record: &VisitRecord,
        window: &PreviousMonthWindow,
        memo: &mut IdentityMemo,
    ) -> VisitCategory {
        let key = identity_key(record);
        let category = self.decide(record, key.as_ref(), window, memo);
        if let Some(key) = key {
            memo.remember(key);
        }
        category
    }

    fn decide(
        &self,
        record: &VisitRecord,
        key: Option<&IdentityKey>,
        window: &PreviousMonthWindow,
        memo: &IdentityMemo,
    ) -> VisitCategory {
        let flags = self.departments.flags(record.department.as_deref());
        if flags.preventive_care {
            return VisitCategory::PureFirst;
        }

        let has_seen_patient = key.is_some_and(|key| memo.has_seen(key));
        let is_first_candidate = record.visit_type == VisitType::FirstVisit
            || (flags.requires_reclassification() && !has_seen_patient);

        let category = if is_first_candidate {
            if !has_seen_patient
                || window.suggests_new_patient(record.patient_number, self.number_window)
            {
                VisitCategory::PureFirst
            } else {
                VisitCategory::ReturningFirst
            }
        } else if record.visit_type == VisitType::FollowUp {
            VisitCategory::Revisit
        } else {
            VisitCategory::Unknown
        };

        trace!(
            date = %record.date_iso,
            has_seen_patient,
            reclassified = flags.requires_reclassification(),
            ?category,
            "classified visit"
        );
        category
    }
}

/// Replay every month in order and classify each record.
///
/// Output has the same cardinality as `records`, ordered by month and then by
/// visit date. The input is never mutated; all replay state lives here.
pub fn classify_visits(
    records: &[VisitRecord],
    config: &ClassifierConfig,
) -> Vec<ClassifiedVisitRecord> {
    let classifier = VisitClassifier::new(config);
    let partitions = MonthPartitions::new(records);

    let (classified, memo) = partitions.iter().fold(
        (Vec::with_capacity(records.len()), IdentityMemo::default()),
        |(mut classified, mut memo), (month, month_records)| {
            let window = previous_month_key(month)
                .and_then(|previous| partitions.get(&previous))
                .map(|previous| PreviousMonthWindow::from_records(previous.iter().copied()))
                .unwrap_or_default();

            debug!(
                month,
                records = month_records.len(),
                previous_numbers = window.len(),
                previous_max = ?window.max_number(),
                "replaying month"
            );

            for record in month_records {
                let category = classifier.classify(record, &window, &mut memo);
                let mut record = (*record).clone();
                record.month_key = month.to_string();
                classified.push(ClassifiedVisitRecord {
                    age: record_age(&record, config.max_valid_age),
                    record,
                    category,
                });
            }
            (classified, memo)
        },
    );

    debug!(
        months = partitions.len(),
        visits = classified.len(),
        identities = memo.len(),
        "classification finished"
    );
    classified
}
