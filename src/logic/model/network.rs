//! Feed-forward Network
//!
//! Dense layers over `ndarray`: ReLU hidden layers and a sigmoid output
//! layer with one unit per class. Input width is fixed at construction and
//! checked on every forward pass.

use std::fmt::Write as _;

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::logic::error::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Sigmoid,
}

impl Activation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Activation::Relu => "relu",
            Activation::Sigmoid => "sigmoid",
        }
    }

    fn apply(&self, z: &mut Array2<f32>) {
        match self {
            Activation::Relu => z.mapv_inplace(|v| v.max(0.0)),
            Activation::Sigmoid => z.mapv_inplace(sigmoid),
        }
    }

    /// Derivative expressed through the activation output
    pub(crate) fn derivative_from_output(&self, a: f32) -> f32 {
        match self {
            Activation::Relu => {
                if a > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Sigmoid => a * (1.0 - a),
        }
    }
}

fn sigmoid(v: f32) -> f32 {
    1.0 / (1.0 + (-v).exp())
}

/// Shape of one dense layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub inputs: usize,
    pub units: usize,
    pub activation: Activation,
}

impl LayerSpec {
    pub fn parameter_count(&self) -> usize {
        self.inputs * self.units + self.units
    }
}

/// Dense layer: `a = act(x · W + b)`, W is (inputs × units)
#[derive(Debug, Clone, PartialEq)]
pub struct DenseLayer {
    pub weights: Array2<f32>,
    pub bias: Array1<f32>,
    pub activation: Activation,
}

impl DenseLayer {
    /// Glorot-uniform weights, zero bias
    fn glorot(inputs: usize, units: usize, activation: Activation, rng: &mut StdRng) -> Self {
        let limit = (6.0 / (inputs + units) as f32).sqrt();
        let weights = Array2::from_shape_fn((inputs, units), |_| rng.gen_range(-limit..limit));
        Self {
            weights,
            bias: Array1::zeros(units),
            activation,
        }
    }

    pub fn spec(&self) -> LayerSpec {
        LayerSpec {
            inputs: self.weights.nrows(),
            units: self.weights.ncols(),
            activation: self.activation,
        }
    }

    fn forward(&self, input: ArrayView2<f32>) -> Array2<f32> {
        let mut z = input.dot(&self.weights);
        z += &self.bias;
        self.activation.apply(&mut z);
        z
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    layers: Vec<DenseLayer>,
}

impl Network {
    /// Build `input → hidden… (ReLU) → outputs (sigmoid)`
    pub fn new(input_width: usize, hidden: &[usize], outputs: usize, seed: u64) -> Result<Self, ModelError> {
        if input_width == 0 {
            return Err(ModelError::InvalidArchitecture("input width must be at least 1".into()));
        }
        if outputs == 0 {
            return Err(ModelError::InvalidArchitecture("output width must be at least 1".into()));
        }
        if let Some(pos) = hidden.iter().position(|&u| u == 0) {
            return Err(ModelError::InvalidArchitecture(format!("hidden layer {} has zero units", pos)));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut layers = Vec::with_capacity(hidden.len() + 1);
        let mut width = input_width;

        for &units in hidden {
            layers.push(DenseLayer::glorot(width, units, Activation::Relu, &mut rng));
            width = units;
        }
        layers.push(DenseLayer::glorot(width, outputs, Activation::Sigmoid, &mut rng));

        Ok(Self { layers })
    }

    /// Rebuild from explicit layers, validating that widths chain
    pub fn from_layers(layers: Vec<DenseLayer>) -> Result<Self, ModelError> {
        if layers.is_empty() {
            return Err(ModelError::InvalidArchitecture("network has no layers".into()));
        }
        for (i, layer) in layers.iter().enumerate() {
            if layer.bias.len() != layer.weights.ncols() {
                return Err(ModelError::ShapeMismatch {
                    context: "layer bias",
                    expected: layer.weights.ncols(),
                    found: layer.bias.len(),
                });
            }
            if i > 0 && layers[i - 1].weights.ncols() != layer.weights.nrows() {
                return Err(ModelError::ShapeMismatch {
                    context: "layer chaining",
                    expected: layers[i - 1].weights.ncols(),
                    found: layer.weights.nrows(),
                });
            }
        }
        Ok(Self { layers })
    }

    pub fn input_width(&self) -> usize {
        self.layers.first().map(|l| l.weights.nrows()).unwrap_or(0)
    }

    pub fn output_width(&self) -> usize {
        self.layers.last().map(|l| l.weights.ncols()).unwrap_or(0)
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [DenseLayer] {
        &mut self.layers
    }

    pub fn specs(&self) -> Vec<LayerSpec> {
        self.layers.iter().map(DenseLayer::spec).collect()
    }

    pub fn parameter_count(&self) -> usize {
        self.specs().iter().map(LayerSpec::parameter_count).sum()
    }

    pub fn check_input(&self, width: usize) -> Result<(), ModelError> {
        if width != self.input_width() {
            return Err(ModelError::ShapeMismatch {
                context: "network input",
                expected: self.input_width(),
                found: width,
            });
        }
        Ok(())
    }

    /// Output scores for a batch, one row per sample
    pub fn forward(&self, batch: ArrayView2<f32>) -> Result<Array2<f32>, ModelError> {
        self.check_input(batch.ncols())?;
        let mut activations = batch.to_owned();
        for layer in &self.layers {
            activations = layer.forward(activations.view());
        }
        Ok(activations)
    }

    /// Forward pass keeping every activation; index 0 is the input
    pub(crate) fn forward_trace(&self, batch: ArrayView2<f32>) -> Result<Vec<Array2<f32>>, ModelError> {
        self.check_input(batch.ncols())?;
        let mut trace = Vec::with_capacity(self.layers.len() + 1);
        trace.push(batch.to_owned());
        for layer in &self.layers {
            let next = layer.forward(trace[trace.len() - 1].view());
            trace.push(next);
        }
        Ok(trace)
    }

    /// Layer table with parameter counts
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{:<10} {:<10} {:>8} {:>10}", "layer", "activation", "shape", "params");
        for (i, spec) in self.specs().iter().enumerate() {
            let _ = writeln!(
                out,
                "{:<10} {:<10} {:>8} {:>10}",
                format!("dense_{}", i),
                spec.activation.as_str(),
                format!("{}x{}", spec.inputs, spec.units),
                spec.parameter_count()
            );
        }
        let _ = write!(out, "total params: {}", self.parameter_count());
        out
    }
}

/// Index of the largest score; first one wins on ties
pub fn argmax_rows(scores: ArrayView2<f32>) -> Vec<usize> {
    scores
        .axis_iter(Axis(0))
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0usize, f32::NEG_INFINITY), |(bi, bv), (i, &v)| if v > bv { (i, v) } else { (bi, bv) })
                .0
        })
        .collect()
}
