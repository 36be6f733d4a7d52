//! Best-effort patient identity across records.
//!
//! Two independent signals are kept while months are replayed in order:
//! the numeric window of the immediately preceding calendar month, and a
//! cumulative memo of every identity key seen so far in the run.

use std::collections::HashSet;
use std::fmt;

use visits_core::{parse_iso_date, VisitRecord};

use crate::department::normalize_label;

/// Identity key, in priority order of the signals that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    Number(i64),
    NameAndBirth { name: String, birth: String },
    Name(String),
    Birth(String),
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::Number(number) => write!(f, "num:{number}"),
            IdentityKey::NameAndBirth { name, birth } => write!(f, "name:{name}|birth:{birth}"),
            IdentityKey::Name(name) => write!(f, "name:{name}"),
            IdentityKey::Birth(birth) => write!(f, "birth:{birth}"),
        }
    }
}

/// Derive the identity key of a record; `None` when no signal is present.
pub fn identity_key(record: &VisitRecord) -> Option<IdentityKey> {
    if let Some(number) = record.patient_number {
        return Some(IdentityKey::Number(number));
    }

    let name = record
        .patient_name_normalized
        .as_deref()
        .map(normalize_label)
        .filter(|name| !name.is_empty());
    let birth = record
        .birth_date_iso
        .as_deref()
        .and_then(normalize_birth_date);

    match (name, birth) {
        (Some(name), Some(birth)) => Some(IdentityKey::NameAndBirth { name, birth }),
        (Some(name), None) => Some(IdentityKey::Name(name)),
        (None, Some(birth)) => Some(IdentityKey::Birth(birth)),
        (None, None) => None,
    }
}

fn normalize_birth_date(raw: &str) -> Option<String> {
    if let Some(date) = parse_iso_date(raw) {
        return Some(date.format("%Y-%m-%d").to_string());
    }
    let label = normalize_label(raw);
    if label.is_empty() {
        None
    } else {
        Some(label)
    }
}

/// Patient numbers observed in the month right before the one being classified.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviousMonthWindow {
    numbers: HashSet<i64>,
    max_number: Option<i64>,
}

impl PreviousMonthWindow {
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a VisitRecord>,
    {
        let numbers: HashSet<i64> = records
            .into_iter()
            .filter_map(|record| record.patient_number)
            .collect();
        let max_number = numbers.iter().copied().max();
        Self {
            numbers,
            max_number,
        }
    }

    pub fn contains(&self, number: i64) -> bool {
        self.numbers.contains(&number)
    }

    pub fn max_number(&self) -> Option<i64> {
        self.max_number
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    /// Numeric-proximity check for an already-seen identity labeled as a
    /// first visit. `true` means the number still looks like a new patient.
    pub fn suggests_new_patient(&self, number: Option<i64>, window: i64) -> bool {
        let Some(number) = number else {
            return self.max_number.is_none();
        };
        match self.max_number {
            None => !self.contains(number),
            Some(max) if number > max || number >= max.saturating_sub(window) => {
                !self.contains(number)
            }
            Some(_) => false,
        }
    }
}

/// Cumulative set of identity keys seen during one replay. Never shrinks.
#[derive(Debug, Clone, Default)]
pub struct IdentityMemo {
    seen: HashSet<IdentityKey>,
}

impl IdentityMemo {
    pub fn has_seen(&self, key: &IdentityKey) -> bool {
        self.seen.contains(key)
    }

    /// Returns `true` if the key was not already present.
    pub fn remember(&mut self, key: IdentityKey) -> bool {
        self.seen.insert(key)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
