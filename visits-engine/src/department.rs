//! Free-text department matching against the configured keyword sets.

use visits_core::ClassifierConfig;

/// Collapse whitespace runs and case-fold.
pub fn normalize_label(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect()
}

/// Boolean flags derived from a single department label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepartmentFlags {
    pub preventive_care: bool,
    pub self_pay_telemedicine: bool,
    pub foreign_patient_self_pay: bool,
    pub endoscopy: bool,
}

impl DepartmentFlags {
    /// Departments whose first-visit/follow-up label is known to be unreliable.
    pub fn requires_reclassification(&self) -> bool {
        self.self_pay_telemedicine || self.foreign_patient_self_pay
    }
}

/// Keyword sets from [`ClassifierConfig`], normalized once up front.
#[derive(Debug, Clone)]
pub struct DepartmentMatcher {
    preventive_care: Vec<String>,
    telemedicine: Vec<String>,
    self_pay: Vec<String>,
    drug_program: Vec<String>,
    foreign_patient: Vec<String>,
    endoscopy: Vec<String>,
}

impl DepartmentMatcher {
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            preventive_care: normalize_all(&config.preventive_care_keywords),
            telemedicine: normalize_all(&config.telemedicine_keywords),
            self_pay: normalize_all(&config.self_pay_keywords),
            drug_program: normalize_all(&config.drug_program_markers),
            foreign_patient: normalize_all(&config.foreign_patient_keywords),
            endoscopy: normalize_all(&config.endoscopy_keywords),
        }
    }

    pub fn flags(&self, department: Option<&str>) -> DepartmentFlags {
        let Some(department) = department else {
            return DepartmentFlags::default();
        };
        let label = normalize_label(department);
        if label.is_empty() {
            return DepartmentFlags::default();
        }
        let tokens = tokenize(&label);

        let telemedicine = contains_any(&label, &self.telemedicine);
        let self_pay_or_program = contains_any(&label, &self.self_pay)
            || self
                .drug_program
                .iter()
                .any(|marker| tokens.iter().any(|token| *token == marker.as_str()));

        DepartmentFlags {
            preventive_care: contains_any(&label, &self.preventive_care),
            self_pay_telemedicine: telemedicine && self_pay_or_program,
            foreign_patient_self_pay: contains_any(&label, &self.foreign_patient),
            endoscopy: contains_any(&label, &self.endoscopy),
        }
    }

    pub fn is_endoscopy(&self, department: Option<&str>) -> bool {
        department
            .map(|label| contains_any(&normalize_label(label), &self.endoscopy))
            .unwrap_or(false)
    }
}

fn normalize_all(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|keyword| normalize_label(keyword))
        .filter(|keyword| !keyword.is_empty())
        .collect()
}

fn contains_any(label: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|keyword| label.contains(keyword.as_str()))
}
