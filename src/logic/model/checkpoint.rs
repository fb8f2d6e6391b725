//! Weight Snapshots
//!
//! Serializable network weights and per-epoch checkpoint files
//! (`checkpoint-epoch-NNN.json`). File names sort by epoch, so the latest
//! snapshot is the last one in name order.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::network::{Activation, DenseLayer, LayerSpec, Network};
use crate::logic::error::ModelError;

const CHECKPOINT_PREFIX: &str = "checkpoint-epoch-";

// ============================================================================
// WEIGHTS
// ============================================================================

/// Row-major weights of one dense layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerWeights {
    pub inputs: usize,
    pub units: usize,
    pub activation: Activation,
    pub weights: Vec<f32>,
    pub bias: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkWeights {
    pub layers: Vec<LayerWeights>,
}

impl NetworkWeights {
    pub fn from_network(network: &Network) -> Self {
        let layers = network
            .layers()
            .iter()
            .map(|layer| LayerWeights {
                inputs: layer.weights.nrows(),
                units: layer.weights.ncols(),
                activation: layer.activation,
                weights: layer.weights.iter().copied().collect(),
                bias: layer.bias.to_vec(),
            })
            .collect();
        Self { layers }
    }

    pub fn specs(&self) -> Vec<LayerSpec> {
        self.layers
            .iter()
            .map(|l| LayerSpec {
                inputs: l.inputs,
                units: l.units,
                activation: l.activation,
            })
            .collect()
    }

    pub fn into_network(self) -> Result<Network, ModelError> {
        let mut layers = Vec::with_capacity(self.layers.len());
        for layer in self.layers {
            if layer.bias.len() != layer.units {
                return Err(ModelError::ShapeMismatch {
                    context: "stored bias",
                    expected: layer.units,
                    found: layer.bias.len(),
                });
            }
            let found = layer.weights.len();
            let weights = Array2::from_shape_vec((layer.inputs, layer.units), layer.weights).map_err(|_| {
                ModelError::ShapeMismatch {
                    context: "stored weights",
                    expected: layer.inputs * layer.units,
                    found,
                }
            })?;
            layers.push(DenseLayer {
                weights,
                bias: Array1::from(layer.bias),
                activation: layer.activation,
            });
        }
        Network::from_layers(layers)
    }
}

// ============================================================================
// CHECKPOINTS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub epoch: usize,
    pub saved_at: DateTime<Utc>,
    pub weights: NetworkWeights,
}

pub struct CheckpointWriter {
    dir: PathBuf,
}

impl CheckpointWriter {
    pub fn new(dir: PathBuf) -> Result<Self, ModelError> {
        fs::create_dir_all(&dir).map_err(|e| ModelError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("{}{:03}.json", CHECKPOINT_PREFIX, epoch))
    }

    pub fn save(&self, epoch: usize, network: &Network) -> Result<PathBuf, ModelError> {
        let checkpoint = Checkpoint {
            epoch,
            saved_at: Utc::now(),
            weights: NetworkWeights::from_network(network),
        };
        let path = self.path_for(epoch);
        let json = serde_json::to_vec(&checkpoint)?;
        fs::write(&path, json).map_err(|e| ModelError::io(&path, e))?;
        log::debug!("Checkpoint written: {}", path.display());
        Ok(path)
    }

    /// Most recent checkpoint file, if any
    pub fn latest(&self) -> Result<Option<PathBuf>, ModelError> {
        let mut entries = fs::read_dir(&self.dir)
            .map_err(|e| ModelError::io(&self.dir, e))?
            .filter_map(|res| res.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension().map_or(false, |ext| ext == "json")
                    && p.file_name()
                        .and_then(|n| n.to_str())
                        .map_or(false, |n| n.starts_with(CHECKPOINT_PREFIX))
            })
            .collect::<Vec<_>>();

        entries.sort();
        Ok(entries.pop())
    }
}

pub fn read_checkpoint(path: &Path) -> Result<Checkpoint, ModelError> {
    let bytes = fs::read(path).map_err(|e| ModelError::io(path, e))?;
    Ok(serde_json::from_slice(&bytes)?)
}

impl Network {
    /// Restore weights from a checkpoint of the same shape; returns its epoch
    pub fn load_checkpoint(&mut self, path: &Path) -> Result<usize, ModelError> {
        let checkpoint = read_checkpoint(path)?;
        let stored = checkpoint.weights.specs();
        let current = self.specs();

        if stored.len() != current.len() {
            return Err(ModelError::ShapeMismatch {
                context: "checkpoint layer count",
                expected: current.len(),
                found: stored.len(),
            });
        }
        for (want, got) in current.iter().zip(&stored) {
            if want != got {
                return Err(ModelError::ShapeMismatch {
                    context: "checkpoint layer shape",
                    expected: want.parameter_count(),
                    found: got.parameter_count(),
                });
            }
        }

        *self = checkpoint.weights.into_network()?;
        log::info!("Restored epoch {} weights from {}", checkpoint.epoch, path.display());
        Ok(checkpoint.epoch)
    }
}
