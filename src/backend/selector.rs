// src/backend/selector.rs

use std::collections::BTreeMap;
use std::fmt;

use super::{NAME_LABEL, PHASE_LABEL};

/// Label selector used to query the backend.
///
/// Renders in Kubernetes selector syntax (`key` or `key=value`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelSelector {
    /// Any job carrying the label, whatever its value.
    Exists(String),
    /// Jobs whose label equals the given value.
    Equals(String, String),
}

impl LabelSelector {
    /// Every job created by a run (anything with a phase label).
    pub fn run() -> Self {
        LabelSelector::Exists(PHASE_LABEL.to_string())
    }

    pub fn phase(index: usize) -> Self {
        LabelSelector::Equals(PHASE_LABEL.to_string(), index.to_string())
    }

    pub fn job_name(name: &str) -> Self {
        LabelSelector::Equals(NAME_LABEL.to_string(), name.to_string())
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        match self {
            LabelSelector::Exists(key) => labels.contains_key(key),
            LabelSelector::Equals(key, value) => labels.get(key) == Some(value),
        }
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelSelector::Exists(key) => write!(f, "{key}"),
            LabelSelector::Equals(key, value) => write!(f, "{key}={value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_kubernetes_syntax() {
        assert_eq!(LabelSelector::run().to_string(), "phase");
        assert_eq!(LabelSelector::phase(2).to_string(), "phase=2");
        assert_eq!(LabelSelector::job_name("load").to_string(), "jobname=load");
    }

    #[test]
    fn matches_by_presence_or_value() {
        let labels = BTreeMap::from([
            ("phase".to_string(), "1".to_string()),
            ("jobname".to_string(), "load".to_string()),
        ]);

        assert!(LabelSelector::run().matches(&labels));
        assert!(LabelSelector::phase(1).matches(&labels));
        assert!(!LabelSelector::phase(0).matches(&labels));
        assert!(!LabelSelector::job_name("extract").matches(&labels));
        assert!(!LabelSelector::run().matches(&BTreeMap::new()));
    }
}
