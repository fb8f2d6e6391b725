//! Training Loop
//!
//! Mini-batch Adam on sparse categorical cross-entropy. The output layer is
//! sigmoid, so scores are clipped and renormalized to sum to one before
//! taking the log.

use std::path::PathBuf;
use std::time::Instant;

use ndarray::{Array1, Array2, ArrayView2, Axis, Zip};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::checkpoint::CheckpointWriter;
use super::network::{argmax_rows, DenseLayer, Network};
use crate::constants::{
    default_model_dir, DEFAULT_BATCH_SIZE, DEFAULT_EPOCHS, DEFAULT_HIDDEN_LAYERS,
    DEFAULT_LEARNING_RATE, DEFAULT_MODEL_SEED,
};
use crate::logic::error::ModelError;

/// Probability clip
const EPSILON: f32 = 1e-7;

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub hidden_layers: Vec<usize>,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f32,
    /// Seeds weight init and per-epoch shuffling
    pub seed: u64,
    /// Where the trained bundle is written
    pub model_dir: PathBuf,
    /// Per-epoch weight snapshots, disabled when unset
    pub checkpoint_dir: Option<PathBuf>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            hidden_layers: DEFAULT_HIDDEN_LAYERS.to_vec(),
            epochs: DEFAULT_EPOCHS,
            batch_size: DEFAULT_BATCH_SIZE,
            learning_rate: DEFAULT_LEARNING_RATE,
            seed: DEFAULT_MODEL_SEED,
            model_dir: default_model_dir(),
            checkpoint_dir: None,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.epochs == 0 {
            return Err(ModelError::InvalidTraining("epochs must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(ModelError::InvalidTraining("batch size must be at least 1".into()));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ModelError::InvalidTraining(format!(
                "learning rate {} must be positive",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

// ============================================================================
// LOSS
// ============================================================================

/// Cross-entropy of one score row against its class index
pub fn sparse_categorical_crossentropy(scores: &[f32], label: usize) -> f32 {
    let clipped: Vec<f32> = scores.iter().map(|s| s.clamp(EPSILON, 1.0 - EPSILON)).collect();
    let total: f32 = clipped.iter().sum();
    let p = clipped.get(label).copied().unwrap_or(EPSILON) / total;
    -p.ln()
}

/// Mean loss over a batch of score rows
pub fn mean_loss(scores: ArrayView2<f32>, labels: &[usize]) -> f32 {
    if labels.is_empty() {
        return 0.0;
    }
    let sum: f32 = scores
        .axis_iter(Axis(0))
        .zip(labels)
        .map(|(row, &label)| sparse_categorical_crossentropy(&row.to_vec(), label))
        .sum();
    sum / labels.len() as f32
}

/// dL/da for the output activations, averaged over the batch
fn output_gradient(scores: ArrayView2<f32>, labels: &[usize]) -> Array2<f32> {
    let batch = labels.len().max(1) as f32;
    let mut grad = Array2::<f32>::zeros(scores.raw_dim());

    for ((mut g, row), &label) in grad.axis_iter_mut(Axis(0)).zip(scores.axis_iter(Axis(0))).zip(labels) {
        let clipped: Vec<f32> = row.iter().map(|s| s.clamp(EPSILON, 1.0 - EPSILON)).collect();
        let total: f32 = clipped.iter().sum();
        for (j, value) in g.iter_mut().enumerate() {
            let mut d = 1.0 / total;
            if j == label {
                d -= 1.0 / clipped[j];
            }
            *value = d / batch;
        }
    }
    grad
}

// ============================================================================
// OPTIMIZER
// ============================================================================

/// Adam (β1 0.9, β2 0.999, ε 1e-7) with bias-corrected step size
#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    step: i32,
    m_w: Vec<Array2<f32>>,
    v_w: Vec<Array2<f32>>,
    m_b: Vec<Array1<f32>>,
    v_b: Vec<Array1<f32>>,
}

impl Adam {
    pub fn new(learning_rate: f32, layers: &[DenseLayer]) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            step: 0,
            m_w: layers.iter().map(|l| Array2::zeros(l.weights.raw_dim())).collect(),
            v_w: layers.iter().map(|l| Array2::zeros(l.weights.raw_dim())).collect(),
            m_b: layers.iter().map(|l| Array1::zeros(l.bias.raw_dim())).collect(),
            v_b: layers.iter().map(|l| Array1::zeros(l.bias.raw_dim())).collect(),
        }
    }

    fn apply(&mut self, layers: &mut [DenseLayer], grads: &[(Array2<f32>, Array1<f32>)]) {
        self.step += 1;
        let (b1, b2, eps) = (self.beta1, self.beta2, self.epsilon);
        let lr_t = self.learning_rate * (1.0 - b2.powi(self.step)).sqrt() / (1.0 - b1.powi(self.step));

        for (i, (layer, (gw, gb))) in layers.iter_mut().zip(grads).enumerate() {
            Zip::from(&mut layer.weights)
                .and(&mut self.m_w[i])
                .and(&mut self.v_w[i])
                .and(gw)
                .for_each(|w, m, v, &g| {
                    *m = b1 * *m + (1.0 - b1) * g;
                    *v = b2 * *v + (1.0 - b2) * g * g;
                    *w -= lr_t * *m / (v.sqrt() + eps);
                });
            Zip::from(&mut layer.bias)
                .and(&mut self.m_b[i])
                .and(&mut self.v_b[i])
                .and(gb)
                .for_each(|b, m, v, &g| {
                    *m = b1 * *m + (1.0 - b1) * g;
                    *v = b2 * *v + (1.0 - b2) * g * g;
                    *b -= lr_t * *m / (v.sqrt() + eps);
                });
        }
    }
}

// ============================================================================
// TRAINER
// ============================================================================

/// Loss and accuracy after one epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    pub epoch: usize,
    pub loss: f32,
    pub accuracy: f32,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub epochs: Vec<EpochStats>,
}

impl TrainingHistory {
    pub fn last(&self) -> Option<&EpochStats> {
        self.epochs.last()
    }
}

pub struct Trainer<'a> {
    config: &'a TrainingConfig,
    checkpoints: Option<CheckpointWriter>,
}

impl<'a> Trainer<'a> {
    pub fn new(config: &'a TrainingConfig) -> Result<Self, ModelError> {
        config.validate()?;
        let checkpoints = match &config.checkpoint_dir {
            Some(dir) => Some(CheckpointWriter::new(dir.clone())?),
            None => None,
        };
        Ok(Self { config, checkpoints })
    }

    /// Fit `network` in place on already scaled rows
    pub fn fit(&self, network: &mut Network, x: ArrayView2<f32>, y: &[usize]) -> Result<TrainingHistory, ModelError> {
        network.check_input(x.ncols())?;
        if x.nrows() != y.len() {
            return Err(ModelError::ShapeMismatch {
                context: "training labels",
                expected: x.nrows(),
                found: y.len(),
            });
        }
        if x.nrows() == 0 {
            return Err(ModelError::InvalidTraining("no training rows".into()));
        }
        let classes = network.output_width();
        if let Some(&bad) = y.iter().find(|&&label| label >= classes) {
            return Err(ModelError::ShapeMismatch {
                context: "label index vs output units",
                expected: classes,
                found: bad + 1,
            });
        }

        let mut optimizer = Adam::new(self.config.learning_rate, network.layers());
        let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(1));
        let mut order: Vec<usize> = (0..x.nrows()).collect();
        let mut history = TrainingHistory::default();

        log::info!(
            "Training {} rows x {} features: epochs={}, batch={}, lr={}",
            x.nrows(),
            x.ncols(),
            self.config.epochs,
            self.config.batch_size,
            self.config.learning_rate
        );

        for epoch in 1..=self.config.epochs {
            let start = Instant::now();
            order.shuffle(&mut rng);

            let mut loss_sum = 0.0f32;
            let mut correct = 0usize;

            for (batch_no, chunk) in order.chunks(self.config.batch_size).enumerate() {
                let xb = x.select(Axis(0), chunk);
                let yb: Vec<usize> = chunk.iter().map(|&i| y[i]).collect();

                let trace = network.forward_trace(xb.view())?;
                let output = &trace[trace.len() - 1];

                let batch_loss = mean_loss(output.view(), &yb);
                loss_sum += batch_loss * yb.len() as f32;
                correct += argmax_rows(output.view()).iter().zip(&yb).filter(|(p, t)| p == t).count();

                let grads = backward(network, &trace, &yb);
                optimizer.apply(network.layers_mut(), &grads);

                log::debug!("epoch {} batch {}: loss {:.5}", epoch, batch_no, batch_loss);
            }

            let stats = EpochStats {
                epoch,
                loss: loss_sum / y.len() as f32,
                accuracy: correct as f32 / y.len() as f32,
                duration_ms: start.elapsed().as_millis() as u64,
            };
            log::info!(
                "Epoch {}/{} - loss: {:.4} - accuracy: {:.4} ({} ms)",
                epoch,
                self.config.epochs,
                stats.loss,
                stats.accuracy,
                stats.duration_ms
            );

            if let Some(writer) = &self.checkpoints {
                writer.save(epoch, network)?;
            }
            history.epochs.push(stats);
        }

        Ok(history)
    }
}

/// Gradients for every layer, output layer last
fn backward(network: &Network, trace: &[Array2<f32>], labels: &[usize]) -> Vec<(Array2<f32>, Array1<f32>)> {
    let layers = network.layers();
    let mut grads = Vec::with_capacity(layers.len());

    // dL/dz at the output
    let output = &trace[layers.len()];
    let mut delta = output_gradient(output.view(), labels);
    let out_act = layers[layers.len() - 1].activation;
    Zip::from(&mut delta).and(output).for_each(|d, &a| *d *= out_act.derivative_from_output(a));

    for l in (0..layers.len()).rev() {
        let input = &trace[l];
        let gw = input.t().dot(&delta);
        let gb = delta.sum_axis(Axis(0));

        if l > 0 {
            let mut next = delta.dot(&layers[l].weights.t());
            let act = layers[l - 1].activation;
            Zip::from(&mut next).and(input).for_each(|d, &a| *d *= act.derivative_from_output(a));
            delta = next;
        }
        grads.push((gw, gb));
    }

    grads.reverse();
    grads
}
