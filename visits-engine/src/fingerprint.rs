//! Cache key for the idempotent analysis.

use sha2::{Digest, Sha256};
use visits_core::{ClassifierConfig, VisitRecord};

/// SHA-256 hex over the records (input order) and the configuration.
///
/// Any edit to historical records or keyword sets changes the key.
pub fn dataset_fingerprint(records: &[VisitRecord], config: &ClassifierConfig) -> String {
    let mut hasher = Sha256::new();
    for record in records {
        if let Ok(bytes) = serde_json::to_vec(record) {
            hasher.update(&bytes);
        }
        hasher.update(b"\n");
    }
    hasher.update(b"--config--");
    if let Ok(bytes) = serde_json::to_vec(config) {
        hasher.update(&bytes);
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use visits_core::VisitType;

    fn records() -> Vec<VisitRecord> {
        vec![
            VisitRecord::new("2025-01-01", VisitType::FirstVisit).with_patient_number(1),
            VisitRecord::new("2025-01-02", VisitType::FollowUp).with_patient_number(2),
        ]
    }

    #[test]
    fn stable_for_identical_input() {
        let config = ClassifierConfig::default();
        let a = dataset_fingerprint(&records(), &config);
        let b = dataset_fingerprint(&records(), &config);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn changes_with_data_or_config() {
        let config = ClassifierConfig::default();
        let base = dataset_fingerprint(&records(), &config);

        let mut edited = records();
        edited[1].visit_type = VisitType::FirstVisit;
        assert_ne!(base, dataset_fingerprint(&edited, &config));

        let wider = ClassifierConfig {
            number_window: 500,
            ..ClassifierConfig::default()
        };
        assert_ne!(base, dataset_fingerprint(&records(), &wider));
    }
}
