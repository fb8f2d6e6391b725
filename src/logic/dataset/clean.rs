//! Record Cleaning
//!
//! Order matters:
//! 1. infinite → missing
//! 2. missing → column mean over the non-missing entries
//! 3. negative → 0
//!
//! The mean in step 2 still includes negative values.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::loader::RawTable;
use super::FlowDataset;
use crate::logic::error::DataError;

/// Counters for what cleaning touched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningStats {
    pub infinite_replaced: usize,
    pub missing_filled: usize,
    pub negatives_clamped: usize,
}

/// Clean a raw table into a finite, non-negative dataset
pub fn clean(raw: RawTable) -> Result<(FlowDataset, CleaningStats), DataError> {
    let n_rows = raw.n_rows();
    let n_cols = raw.n_features();
    if n_rows == 0 {
        return Err(DataError::Empty);
    }

    let mut stats = CleaningStats::default();
    let mut features = Array2::<f64>::zeros((n_rows, n_cols));

    for (i, row) in raw.rows.iter().enumerate() {
        if row.len() != n_cols {
            return Err(DataError::RowWidth {
                row: i,
                expected: n_cols,
                found: row.len(),
            });
        }
        for (j, &value) in row.iter().enumerate() {
            features[[i, j]] = if value.is_infinite() {
                stats.infinite_replaced += 1;
                f64::NAN
            } else {
                value
            };
        }
    }

    for (j, mut column) in features.columns_mut().into_iter().enumerate() {
        // Running mean: a plain sum can overflow on byte-rate columns
        let (mean, count) = column
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0.0f64, 0usize), |(m, c), v| {
                let c = c + 1;
                (m + (v - m) / c as f64, c)
            });

        if count == 0 {
            return Err(DataError::EmptyColumn(raw.feature_names[j].clone()));
        }

        for value in column.iter_mut() {
            if value.is_nan() {
                *value = mean;
                stats.missing_filled += 1;
            }
            if *value < 0.0 {
                *value = 0.0;
                stats.negatives_clamped += 1;
            }
        }
    }

    log::info!(
        "Cleaning: {} infinite replaced, {} missing filled with column mean, {} negatives clamped",
        stats.infinite_replaced,
        stats.missing_filled,
        stats.negatives_clamped
    );

    let dataset = FlowDataset::new(raw.feature_names, raw.label_name, features, raw.labels)?;
    Ok((dataset, stats))
}
