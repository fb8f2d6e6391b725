//! Dataset Module - Flow Record Loading & Cleaning
//!
//! Reads CIC-IDS style CSV exports (numeric flow features, label last) and
//! produces a [`FlowDataset`] whose feature matrix is finite and
//! non-negative.

pub mod loader;
pub mod clean;

#[cfg(test)]
mod tests;

use std::path::Path;

use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::logic::error::DataError;
pub use clean::{clean, CleaningStats};
pub use loader::{read_csv, read_csv_file, RawTable};

/// Cleaned flow records: feature matrix plus aligned labels
#[derive(Debug, Clone)]
pub struct FlowDataset {
    feature_names: Vec<String>,
    label_name: String,
    features: Array2<f64>,
    labels: Vec<String>,
}

impl FlowDataset {
    pub fn new(
        feature_names: Vec<String>,
        label_name: String,
        features: Array2<f64>,
        labels: Vec<String>,
    ) -> Result<Self, DataError> {
        if features.nrows() != labels.len() {
            return Err(DataError::LengthMismatch {
                rows: features.nrows(),
                labels: labels.len(),
            });
        }
        if features.ncols() != feature_names.len() {
            return Err(DataError::RowWidth {
                row: 0,
                expected: feature_names.len(),
                found: features.ncols(),
            });
        }

        Ok(Self {
            feature_names,
            label_name,
            features,
            labels,
        })
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn label_name(&self) -> &str {
        &self.label_name
    }

    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// One cleaned feature row, e.g. a record received for live scoring
    pub fn row(&self, index: usize) -> Result<ArrayView1<'_, f64>, DataError> {
        if index >= self.n_rows() {
            return Err(DataError::RowOutOfRange {
                index,
                rows: self.n_rows(),
            });
        }
        Ok(self.features.row(index))
    }
}

/// Load and clean a CSV file in one step
pub fn load_csv(path: &Path) -> Result<(FlowDataset, CleaningStats), DataError> {
    let raw = read_csv_file(path)?;
    clean(raw)
}
