//! Label Encoder
//!
//! Maps label strings to class indices. Classes are assigned in sorted
//! byte order of the distinct labels, so `BENIGN` → 0 and `DDoS` → 1
//! regardless of which appears first in the file.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::logic::error::DataError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit on the full label vector (before any split)
    pub fn fit<S: AsRef<str>>(labels: &[S]) -> Self {
        let distinct: BTreeSet<&str> = labels.iter().map(AsRef::as_ref).collect();
        let classes: Vec<String> = distinct.into_iter().map(str::to_string).collect();
        log::info!("Label encoder fit: {:?}", classes);
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn encode(&self, label: &str) -> Result<usize, DataError> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map_err(|_| DataError::UnknownLabel(label.to_string()))
    }

    pub fn decode(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    pub fn transform<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>, DataError> {
        labels.iter().map(|l| self.encode(l.as_ref())).collect()
    }

    /// The classifier is binary; class 1 is the attack class
    pub fn require_binary(&self) -> Result<(), DataError> {
        if self.classes.len() != 2 {
            return Err(DataError::ClassCount {
                expected: 2,
                classes: self.classes.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_assignment() {
        let encoder = LabelEncoder::fit(&["DDoS", "BENIGN", "DDoS"]);
        assert_eq!(encoder.classes(), &["BENIGN".to_string(), "DDoS".to_string()]);
        assert_eq!(encoder.encode("BENIGN").unwrap(), 0);
        assert_eq!(encoder.encode("DDoS").unwrap(), 1);
    }

    #[test]
    fn test_bijection_on_fitted_labels() {
        let labels = ["web", "ddos", "benign", "portscan", "ddos"];
        let encoder = LabelEncoder::fit(&labels);

        for label in labels {
            let code = encoder.encode(label).unwrap();
            assert!(code < encoder.num_classes());
            assert_eq!(encoder.decode(code), Some(label));
        }

        let codes = encoder.transform(&labels).unwrap();
        assert_eq!(codes, vec![3, 1, 0, 2, 1]);
    }

    #[test]
    fn test_unknown_label_and_class_count() {
        let encoder = LabelEncoder::fit(&["BENIGN"]);
        assert!(matches!(
            encoder.encode("DDoS"),
            Err(DataError::UnknownLabel(ref l)) if l == "DDoS"
        ));
        assert!(encoder.require_binary().is_err());
        assert!(LabelEncoder::fit(&["BENIGN", "DDoS"]).require_binary().is_ok());
    }
}
