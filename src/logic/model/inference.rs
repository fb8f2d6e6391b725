//! Inference - Per-row Class Scores
//!
//! Runs a forward pass and splits the score matrix into one
//! [`Prediction`] per input row.

use std::time::Instant;

use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::network::Network;
use crate::logic::error::ModelError;

/// Index of the attack class in a prediction
pub const ATTACK_CLASS: usize = 1;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Score vector for one record, one entry per class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub scores: Vec<f32>,
}

impl Prediction {
    pub fn new(scores: Vec<f32>) -> Self {
        Self { scores }
    }

    /// Class with the largest score; the lower index wins a tie
    pub fn argmax(&self) -> usize {
        self.scores
            .iter()
            .enumerate()
            .fold((0usize, f32::NEG_INFINITY), |(bi, bv), (i, &v)| if v > bv { (i, v) } else { (bi, bv) })
            .0
    }

    pub fn score(&self, class: usize) -> Option<f32> {
        self.scores.get(class).copied()
    }

    /// Score at the attack index, 0 when the vector is too short
    pub fn attack_score(&self) -> f32 {
        self.score(ATTACK_CLASS).unwrap_or(0.0)
    }
}

// ============================================================================
// INFERENCE
// ============================================================================

/// Forward a scaled batch and wrap each output row
pub fn infer_batch(network: &Network, batch: ArrayView2<f32>) -> Result<Vec<Prediction>, ModelError> {
    let start = Instant::now();
    let scores = network.forward(batch)?;
    let elapsed = start.elapsed().as_micros();

    log::debug!("Inference on {} rows took {} us", batch.nrows(), elapsed);
    Ok(split_rows(&scores))
}

fn split_rows(scores: &Array2<f32>) -> Vec<Prediction> {
    scores
        .axis_iter(Axis(0))
        .map(|row| Prediction::new(row.to_vec()))
        .collect()
}

/// Argmax class for each prediction
pub fn predict_classes(predictions: &[Prediction]) -> Vec<usize> {
    predictions.iter().map(Prediction::argmax).collect()
}
