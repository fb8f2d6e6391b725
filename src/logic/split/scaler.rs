//! Standard Scaler
//!
//! Per-column standardization (zero mean, unit variance). Statistics use
//! the population variance; a zero-variance column keeps scale 1 so it
//! maps to all zeros instead of NaN.

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::logic::error::ModelError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit on a reference partition (the training rows)
    pub fn fit(x: ArrayView2<f64>) -> Result<Self, ModelError> {
        let n = x.nrows();
        if n == 0 {
            return Err(ModelError::ShapeMismatch {
                context: "scaler fit rows",
                expected: 1,
                found: 0,
            });
        }

        let mut mean = Vec::with_capacity(x.ncols());
        let mut scale = Vec::with_capacity(x.ncols());

        for column in x.axis_iter(Axis(1)) {
            let (m, s) = moments(column.iter().copied()).unwrap_or((0.0, 0.0));
            mean.push(m);
            scale.push(if s > 0.0 && s.is_finite() { s } else { 1.0 });
        }

        Ok(Self { mean, scale })
    }

    pub fn width(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    pub fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, ModelError> {
        self.check_width(x.ncols())?;
        let mut out = x.to_owned();
        for (j, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (m, s) = (self.mean[j], self.scale[j]);
            column.mapv_inplace(|v| standardize(v, m, s));
        }
        Ok(out)
    }

    pub fn inverse_transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, ModelError> {
        self.check_width(x.ncols())?;
        let mut out = x.to_owned();
        for (j, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            let (m, s) = (self.mean[j], self.scale[j]);
            column.mapv_inplace(|v| v * s + m);
        }
        Ok(out)
    }

    pub fn transform_row(&self, row: ArrayView1<f64>) -> Result<Vec<f64>, ModelError> {
        self.check_width(row.len())?;
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(&v, (&m, &s))| standardize(v, m, s))
            .collect())
    }

    fn check_width(&self, width: usize) -> Result<(), ModelError> {
        if width != self.width() {
            return Err(ModelError::ShapeMismatch {
                context: "scaler input",
                expected: self.width(),
                found: width,
            });
        }
        Ok(())
    }
}

/// Population mean and standard deviation of finite values.
///
/// Values are divided by the largest magnitude before a Welford pass, so
/// columns near `f64::MAX` neither overflow the running sum nor the
/// squared deviations. `None` for an empty input.
pub(crate) fn moments<I>(values: I) -> Option<(f64, f64)>
where
    I: Iterator<Item = f64> + Clone,
{
    let peak = values.clone().fold(0.0f64, |acc, v| acc.max(v.abs()));
    let unit = if peak > 0.0 && peak.is_finite() { peak } else { 1.0 };

    let (count, mean, m2) = values.fold((0usize, 0.0f64, 0.0f64), |(c, mean, m2), v| {
        let v = v / unit;
        let c = c + 1;
        let delta = v - mean;
        let mean = mean + delta / c as f64;
        (c, mean, m2 + delta * (v - mean))
    });

    if count == 0 {
        return None;
    }
    let variance = (m2 / count as f64).max(0.0);
    Some((mean * unit, variance.sqrt() * unit))
}

/// `(v - m) / s` without overflowing when `v` and `m` sit far apart
fn standardize(v: f64, m: f64, s: f64) -> f64 {
    let z = (v - m) / s;
    if z.is_finite() {
        z
    } else {
        v / s - m / s
    }
}
