//! Split Module - Train/Test Partition & Scaling
//!
//! Rows are shuffled with a seeded RNG, the first `ceil(fraction * n)`
//! shuffled rows become the test partition. Scaling statistics come from
//! the training partition only unless the per-partition mode is selected.

pub mod scaler;

use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::logic::error::{DataError, ModelError};
pub use scaler::StandardScaler;

/// Partitioned rows with their original indices
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Vec<usize>,
    pub y_test: Vec<usize>,
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Deterministic shuffled split
pub fn train_test_split(
    x: ArrayView2<f64>,
    y: &[usize],
    test_fraction: f64,
    seed: u64,
) -> Result<DatasetSplit, DataError> {
    let n = x.nrows();
    if n != y.len() {
        return Err(DataError::LengthMismatch { rows: n, labels: y.len() });
    }
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(DataError::InvalidFraction(test_fraction));
    }

    let n_test = (test_fraction * n as f64).ceil() as usize;
    if n_test == 0 {
        return Err(DataError::EmptyPartition("test"));
    }
    if n_test >= n {
        return Err(DataError::EmptyPartition("train"));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at(n_test);

    log::info!(
        "Split {} rows: {} train / {} test (fraction={}, seed={})",
        n,
        train_idx.len(),
        test_idx.len(),
        test_fraction,
        seed
    );

    Ok(DatasetSplit {
        x_train: x.select(Axis(0), train_idx),
        x_test: x.select(Axis(0), test_idx),
        y_train: train_idx.iter().map(|&i| y[i]).collect(),
        y_test: test_idx.iter().map(|&i| y[i]).collect(),
        train_indices: train_idx.to_vec(),
        test_indices: test_idx.to_vec(),
    })
}

/// Where the test partition's scaling statistics come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScalerFitMode {
    /// Fit on train, apply unchanged to test
    #[default]
    Train,
    /// Fit a second scaler on the test partition itself (legacy behaviour)
    PerPartition,
}

impl ScalerFitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalerFitMode::Train => "train",
            ScalerFitMode::PerPartition => "per-partition",
        }
    }
}

impl fmt::Display for ScalerFitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScalerFitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "train" => Ok(ScalerFitMode::Train),
            "per-partition" | "per_partition" => Ok(ScalerFitMode::PerPartition),
            other => Err(format!("unknown scaler fit mode '{}' (expected train or per-partition)", other)),
        }
    }
}

/// Scaled partitions plus the training scaler that serving must reuse
#[derive(Debug, Clone)]
pub struct ScaledSplit {
    pub scaler: StandardScaler,
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
}

pub fn scale_split(split: &DatasetSplit, mode: ScalerFitMode) -> Result<ScaledSplit, ModelError> {
    let scaler = StandardScaler::fit(split.x_train.view())?;
    let x_train = scaler.transform(split.x_train.view())?;

    let x_test = match mode {
        ScalerFitMode::Train => scaler.transform(split.x_test.view())?,
        ScalerFitMode::PerPartition => {
            log::warn!(
                "Scaler fit mode 'per-partition': test rows are standardized with their own statistics, \
                 evaluation no longer reflects serving behaviour"
            );
            StandardScaler::fit(split.x_test.view())?.transform(split.x_test.view())?
        }
    };

    Ok(ScaledSplit { scaler, x_train, x_test })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy(n: usize) -> (Array2<f64>, Vec<usize>) {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| (i * 10 + j) as f64);
        let y = (0..n).map(|i| i % 2).collect();
        (x, y)
    }

    #[test]
    fn test_split_sizes_and_determinism() {
        let (x, y) = toy(101);
        let a = train_test_split(x.view(), &y, 0.2, 0).unwrap();
        let b = train_test_split(x.view(), &y, 0.2, 0).unwrap();

        assert_eq!(a.test_indices.len(), 21); // ceil(20.2)
        assert_eq!(a.train_indices.len(), 80);
        assert_eq!(a.test_indices, b.test_indices);

        let c = train_test_split(x.view(), &y, 0.2, 7).unwrap();
        assert_ne!(a.test_indices, c.test_indices);
    }

    #[test]
    fn test_split_is_a_partition_with_aligned_labels() {
        let (x, y) = toy(50);
        let split = train_test_split(x.view(), &y, 0.3, 3).unwrap();

        let mut all: Vec<usize> = split.train_indices.iter().chain(&split.test_indices).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());

        for (row, &idx) in split.test_indices.iter().enumerate() {
            assert_eq!(split.x_test[[row, 0]], (idx * 10) as f64);
            assert_eq!(split.y_test[row], idx % 2);
        }
    }

    #[test]
    fn test_split_rejects_degenerate_input() {
        let (x, y) = toy(4);
        assert!(matches!(
            train_test_split(x.view(), &y, 0.0, 0),
            Err(DataError::InvalidFraction(_))
        ));
        assert!(matches!(
            train_test_split(x.view(), &y[..3], 0.2, 0),
            Err(DataError::LengthMismatch { .. })
        ));
        let (x1, y1) = toy(1);
        assert!(matches!(
            train_test_split(x1.view(), &y1, 0.2, 0),
            Err(DataError::EmptyPartition("train"))
        ));
    }

    #[test]
    fn test_scaler_fit_on_train_only() {
        let (x, y) = toy(20);
        let split = train_test_split(x.view(), &y, 0.25, 0).unwrap();
        let scaled = scale_split(&split, ScalerFitMode::Train).unwrap();

        let expected = StandardScaler::fit(split.x_train.view()).unwrap();
        assert_eq!(scaled.scaler, expected);
        assert_eq!(scaled.x_test, expected.transform(split.x_test.view()).unwrap());
    }

    #[test]
    fn test_per_partition_mode_refits_on_test() {
        let (x, y) = toy(20);
        let split = train_test_split(x.view(), &y, 0.25, 0).unwrap();
        let scaled = scale_split(&split, ScalerFitMode::PerPartition).unwrap();

        let own = StandardScaler::fit(split.x_test.view()).unwrap();
        assert_eq!(scaled.x_test, own.transform(split.x_test.view()).unwrap());
        assert_eq!(scaled.scaler, StandardScaler::fit(split.x_train.view()).unwrap());
    }

    #[test]
    fn test_fit_mode_parsing() {
        assert_eq!("train".parse::<ScalerFitMode>().unwrap(), ScalerFitMode::Train);
        assert_eq!("Per-Partition".parse::<ScalerFitMode>().unwrap(), ScalerFitMode::PerPartition);
        assert!("both".parse::<ScalerFitMode>().is_err());
    }
}
