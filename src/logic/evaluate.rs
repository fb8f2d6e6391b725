//! Evaluation Metrics
//!
//! Binary classification metrics with class 1 (attack) as the positive
//! class. A metric whose denominator is zero reports 0.

use std::fmt::Write as _;

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::logic::error::DataError;
use crate::logic::model::train::mean_loss;

/// 2×2 confusion matrix, rows are the true class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
    pub tp: usize,
}

impl ConfusionMatrix {
    pub fn from_labels(y_true: &[usize], y_pred: &[usize]) -> Result<Self, DataError> {
        if y_true.len() != y_pred.len() {
            return Err(DataError::LengthMismatch {
                rows: y_pred.len(),
                labels: y_true.len(),
            });
        }

        let mut m = Self::default();
        for (&t, &p) in y_true.iter().zip(y_pred) {
            match (t, p) {
                (0, 0) => m.tn += 1,
                (0, 1) => m.fp += 1,
                (1, 0) => m.fn_ += 1,
                (1, 1) => m.tp += 1,
                _ => {
                    return Err(DataError::LabelOutOfRange {
                        label: t.max(p),
                        classes: 2,
                    })
                }
            }
        }
        Ok(m)
    }

    pub fn total(&self) -> usize {
        self.tn + self.fp + self.fn_ + self.tp
    }

    /// `[[tn, fp], [fn, tp]]`
    pub fn as_rows(&self) -> [[usize; 2]; 2] {
        [[self.tn, self.fp], [self.fn_, self.tp]]
    }

    /// Each cell divided by the total count
    pub fn normalized(&self) -> [[f64; 2]; 2] {
        let total = self.total();
        let rows = self.as_rows();
        let mut out = [[0.0; 2]; 2];
        if total == 0 {
            return out;
        }
        for (i, row) in rows.iter().enumerate() {
            for (j, &cell) in row.iter().enumerate() {
                out[i][j] = cell as f64 / total as f64;
            }
        }
        out
    }

    /// Percentage table, one row per true class
    pub fn render_normalized(&self, class_names: &[String]) -> String {
        let name = |i: usize| class_names.get(i).cloned().unwrap_or_else(|| i.to_string());
        let cells = self.normalized();

        let mut out = String::new();
        let _ = writeln!(out, "{:>14} {:>12} {:>12}", "true \\ pred", name(0), name(1));
        for (i, row) in cells.iter().enumerate() {
            let _ = writeln!(
                out,
                "{:>14} {:>11.2}% {:>11.2}%",
                name(i),
                row[0] * 100.0,
                row[1] * 100.0
            );
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub confusion: ConfusionMatrix,
    /// Mean test loss, when scores were available
    pub loss: Option<f64>,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

pub fn evaluate(y_true: &[usize], y_pred: &[usize]) -> Result<EvaluationReport, DataError> {
    let confusion = ConfusionMatrix::from_labels(y_true, y_pred)?;
    let ConfusionMatrix { tn, fp, fn_, tp } = confusion;

    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    Ok(EvaluationReport {
        accuracy: ratio(tp + tn, confusion.total()),
        precision,
        recall,
        f1,
        confusion,
        loss: None,
    })
}

/// Metrics plus mean cross-entropy over the score matrix
pub fn evaluate_loss(
    scores: ArrayView2<f32>,
    y_true: &[usize],
    y_pred: &[usize],
) -> Result<EvaluationReport, DataError> {
    if scores.nrows() != y_true.len() {
        return Err(DataError::LengthMismatch {
            rows: scores.nrows(),
            labels: y_true.len(),
        });
    }
    let mut report = evaluate(y_true, y_pred)?;
    report.loss = Some(mean_loss(scores, y_true) as f64);
    Ok(report)
}

impl EvaluationReport {
    pub fn log(&self, class_names: &[String]) {
        if let Some(loss) = self.loss {
            log::info!("Test loss: {:.4}", loss);
        }
        log::info!(
            "Accuracy: {:.4}  Precision: {:.4}  Recall: {:.4}  F1: {:.4}",
            self.accuracy,
            self.precision,
            self.recall,
            self.f1
        );
        log::info!(
            "Confusion matrix {:?}, normalized:\n{}",
            self.confusion.as_rows(),
            self.confusion.render_normalized(class_names)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_metrics_on_known_counts() {
        // tn=2 fp=1 fn=1 tp=4
        let y_true = [0, 0, 0, 1, 1, 1, 1, 1];
        let y_pred = [0, 0, 1, 0, 1, 1, 1, 1];
        let report = evaluate(&y_true, &y_pred).unwrap();

        assert_eq!(report.confusion.as_rows(), [[2, 1], [1, 4]]);
        assert!((report.accuracy - 0.75).abs() < 1e-12);
        assert!((report.precision - 0.8).abs() < 1e-12);
        assert!((report.recall - 0.8).abs() < 1e-12);
        assert!((report.f1 - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_zero_denominators_report_zero() {
        let report = evaluate(&[0, 0, 0], &[0, 0, 0]).unwrap();
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.precision, 0.0);
        assert_eq!(report.recall, 0.0);
        assert_eq!(report.f1, 0.0);

        let empty = evaluate(&[], &[]).unwrap();
        assert_eq!(empty.accuracy, 0.0);
        assert_eq!(empty.confusion.normalized(), [[0.0; 2]; 2]);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(matches!(
            evaluate(&[0, 1], &[0]),
            Err(DataError::LengthMismatch { .. })
        ));
        assert!(matches!(
            evaluate(&[0, 2], &[0, 1]),
            Err(DataError::LabelOutOfRange { label: 2, .. })
        ));
    }

    #[test]
    fn test_normalized_rendering() {
        let m = ConfusionMatrix { tn: 1, fp: 1, fn_: 0, tp: 2 };
        assert_eq!(m.normalized(), [[0.25, 0.25], [0.0, 0.5]]);

        let table = m.render_normalized(&["BENIGN".into(), "DDoS".into()]);
        assert!(table.contains("BENIGN"));
        assert!(table.contains("50.00%"));
    }

    #[test]
    fn test_loss_is_attached() {
        let scores = array![[0.5f32, 0.5], [0.5, 0.5]];
        let report = evaluate_loss(scores.view(), &[0, 1], &[0, 0]).unwrap();
        let loss = report.loss.unwrap();
        assert!((loss - std::f64::consts::LN_2).abs() < 1e-5);
    }
}
