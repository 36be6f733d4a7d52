//! Age-at-visit derivation.

use chrono::{Datelike, NaiveDate};
use visits_core::VisitRecord;

/// Completed years between `birth` and `visit`, or `None` outside `[0, max_valid_age)`.
pub fn age_at_visit(birth: NaiveDate, visit: NaiveDate, max_valid_age: u32) -> Option<u32> {
    let mut age = visit.year() - birth.year();

    let has_had_birthday = (visit.month(), visit.day()) >= (birth.month(), birth.day());
    if !has_had_birthday {
        age -= 1;
    }

    u32::try_from(age).ok().filter(|age| *age < max_valid_age)
}

/// Age of the patient on the visit day; unparseable dates yield `None`.
pub fn record_age(record: &VisitRecord, max_valid_age: u32) -> Option<u32> {
    let birth = record.birth_date()?;
    let visit = record.visit_date()?;
    age_at_visit(birth, visit, max_valid_age)
}
