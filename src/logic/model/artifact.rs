//! Model Artifact - Trained Network plus Preprocessing
//!
//! Everything serving needs to score a raw cleaned row: the selected
//! feature projection, the training scaler, the label classes and the
//! weights. Saved either as a bundle directory (`manifest.json` +
//! `weights.json`) or as one legacy JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::checkpoint::NetworkWeights;
use super::inference::{infer_batch, Prediction};
use super::network::{LayerSpec, Network};
use super::train::{Trainer, TrainingConfig, TrainingHistory};
use crate::logic::error::ModelError;
use crate::logic::features::SelectedFeatureSet;
use crate::logic::labels::LabelEncoder;
use crate::logic::split::StandardScaler;

pub const FORMAT_VERSION: u32 = 1;
pub const MANIFEST_FILE: &str = "manifest.json";
pub const WEIGHTS_FILE: &str = "weights.json";

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Training-time transforms that serving must replay
#[derive(Debug, Clone, PartialEq)]
pub struct Preprocessing {
    pub features: SelectedFeatureSet,
    pub scaler: StandardScaler,
    pub labels: LabelEncoder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    pub format_version: u32,
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub layers: Vec<LayerSpec>,
    pub features: SelectedFeatureSet,
    pub scaler: StandardScaler,
    pub labels: LabelEncoder,
    /// Hex SHA-256 of the compact weights JSON
    pub weights_sha256: String,
}

/// Legacy single-file layout
#[derive(Serialize, Deserialize)]
struct SingleFileArtifact {
    manifest: ModelManifest,
    weights: NetworkWeights,
}

#[derive(Debug, Clone)]
pub struct ModelArtifact {
    manifest: ModelManifest,
    network: Network,
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

impl ModelArtifact {
    /// Wrap a network, asserting it matches the preprocessing widths
    pub fn new(network: Network, preprocessing: Preprocessing) -> Result<Self, ModelError> {
        check_widths(&network, &preprocessing.features, &preprocessing.scaler, &preprocessing.labels)?;

        let weights_sha256 = checksum(&weights_bytes(&NetworkWeights::from_network(&network))?);
        let manifest = ModelManifest {
            format_version: FORMAT_VERSION,
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
            layers: network.specs(),
            features: preprocessing.features,
            scaler: preprocessing.scaler,
            labels: preprocessing.labels,
            weights_sha256,
        };

        Ok(Self { manifest, network })
    }

    /// Build a network sized from the selection and fit it on scaled rows
    pub fn train(
        config: &TrainingConfig,
        x: ArrayView2<f32>,
        y: &[usize],
        preprocessing: Preprocessing,
    ) -> Result<(Self, TrainingHistory), ModelError> {
        let input_width = preprocessing.features.len();
        if x.ncols() != input_width {
            return Err(ModelError::ShapeMismatch {
                context: "training batch vs selected features",
                expected: input_width,
                found: x.ncols(),
            });
        }

        let mut network = Network::new(
            input_width,
            &config.hidden_layers,
            preprocessing.labels.num_classes(),
            config.seed,
        )?;
        log::info!("Model architecture:\n{}", network.summary());

        let history = Trainer::new(config)?.fit(&mut network, x, y)?;
        let artifact = Self::new(network, preprocessing)?;
        Ok((artifact, history))
    }

    pub fn manifest(&self) -> &ModelManifest {
        &self.manifest
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn features(&self) -> &SelectedFeatureSet {
        &self.manifest.features
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.manifest.scaler
    }

    pub fn labels(&self) -> &LabelEncoder {
        &self.manifest.labels
    }

    // ========================================================================
    // INFERENCE
    // ========================================================================

    /// Scores for rows already projected and scaled
    pub fn infer(&self, batch: ArrayView2<f32>) -> Result<Vec<Prediction>, ModelError> {
        infer_batch(&self.network, batch)
    }

    /// Project and scale full-width cleaned rows
    pub fn prepare(&self, rows: ArrayView2<f64>) -> Result<Array2<f32>, ModelError> {
        let projected = self.manifest.features.project(rows)?;
        let scaled = self.manifest.scaler.transform(projected.view())?;
        Ok(scaled.mapv(|v| v as f32))
    }

    /// Score one full-width cleaned row
    pub fn infer_row(&self, row: ArrayView1<f64>) -> Result<Prediction, ModelError> {
        let projected = self.manifest.features.project_row(row)?;
        let scaled = self.manifest.scaler.transform_row(ArrayView1::from(&projected[..]))?;
        let width = scaled.len();
        let batch = Array2::from_shape_vec((1, width), scaled.into_iter().map(|v| v as f32).collect())
            .map_err(|_| ModelError::ShapeMismatch {
                context: "single row batch",
                expected: width,
                found: 0,
            })?;

        self.infer(batch.view())?
            .pop()
            .ok_or(ModelError::ShapeMismatch {
                context: "single row output",
                expected: 1,
                found: 0,
            })
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    /// Write `manifest.json` and `weights.json` into `dir`
    pub fn save_bundle(&self, dir: &Path) -> Result<PathBuf, ModelError> {
        fs::create_dir_all(dir).map_err(|e| ModelError::io(dir, e))?;

        let weights = weights_bytes(&NetworkWeights::from_network(&self.network))?;
        let weights_path = dir.join(WEIGHTS_FILE);
        fs::write(&weights_path, &weights).map_err(|e| ModelError::io(&weights_path, e))?;

        let manifest_path = dir.join(MANIFEST_FILE);
        let manifest = serde_json::to_vec_pretty(&self.manifest)?;
        fs::write(&manifest_path, manifest).map_err(|e| ModelError::io(&manifest_path, e))?;

        log::info!(
            "Saved model bundle {} (run {}, sha256 {})",
            dir.display(),
            self.manifest.run_id,
            self.manifest.weights_sha256
        );
        Ok(dir.to_path_buf())
    }

    /// Write manifest and weights together into one JSON file
    pub fn save_file(&self, path: &Path) -> Result<PathBuf, ModelError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ModelError::io(parent, e))?;
        }
        let single = SingleFileArtifact {
            manifest: self.manifest.clone(),
            weights: NetworkWeights::from_network(&self.network),
        };
        let json = serde_json::to_vec(&single)?;
        fs::write(path, json).map_err(|e| ModelError::io(path, e))?;
        log::info!("Saved model file {}", path.display());
        Ok(path.to_path_buf())
    }

    /// Load a bundle directory or a single-file artifact
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let (manifest, weights) = if path.is_dir() {
            let manifest_path = path.join(MANIFEST_FILE);
            let weights_path = path.join(WEIGHTS_FILE);
            let manifest_bytes = fs::read(&manifest_path).map_err(|e| ModelError::io(&manifest_path, e))?;
            let weights_bytes = fs::read(&weights_path).map_err(|e| ModelError::io(&weights_path, e))?;

            let manifest: ModelManifest = serde_json::from_slice(&manifest_bytes)?;
            verify_checksum(&manifest, &weights_bytes)?;
            let weights: NetworkWeights = serde_json::from_slice(&weights_bytes)?;
            (manifest, weights)
        } else {
            let bytes = fs::read(path).map_err(|e| ModelError::io(path, e))?;
            let single: SingleFileArtifact = serde_json::from_slice(&bytes)?;
            verify_checksum(&single.manifest, &weights_bytes(&single.weights)?)?;
            (single.manifest, single.weights)
        };

        if manifest.format_version != FORMAT_VERSION {
            return Err(ModelError::UnsupportedVersion(manifest.format_version));
        }
        if manifest.layers != weights.specs() {
            return Err(ModelError::ShapeMismatch {
                context: "manifest layers vs stored weights",
                expected: manifest.layers.len(),
                found: weights.layers.len(),
            });
        }

        let network = weights.into_network()?;
        check_widths(&network, &manifest.features, &manifest.scaler, &manifest.labels)?;

        log::info!(
            "Loaded model run {} created {} ({} features, {} params)",
            manifest.run_id,
            manifest.created_at.to_rfc3339(),
            manifest.features.len(),
            network.parameter_count()
        );
        log::info!("Model architecture:\n{}", network.summary());

        Ok(Self { manifest, network })
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn check_widths(
    network: &Network,
    features: &SelectedFeatureSet,
    scaler: &StandardScaler,
    labels: &LabelEncoder,
) -> Result<(), ModelError> {
    if network.input_width() != features.len() {
        return Err(ModelError::ShapeMismatch {
            context: "network input vs selected features",
            expected: features.len(),
            found: network.input_width(),
        });
    }
    if scaler.width() != features.len() {
        return Err(ModelError::ShapeMismatch {
            context: "scaler width vs selected features",
            expected: features.len(),
            found: scaler.width(),
        });
    }
    if network.output_width() != labels.num_classes() {
        return Err(ModelError::ShapeMismatch {
            context: "network output vs label classes",
            expected: labels.num_classes(),
            found: network.output_width(),
        });
    }
    Ok(())
}

fn weights_bytes(weights: &NetworkWeights) -> Result<Vec<u8>, ModelError> {
    Ok(serde_json::to_vec(weights)?)
}

fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn verify_checksum(manifest: &ModelManifest, weights: &[u8]) -> Result<(), ModelError> {
    let actual = checksum(weights);
    if actual != manifest.weights_sha256 {
        return Err(ModelError::Checksum {
            expected: manifest.weights_sha256.clone(),
            actual,
        });
    }
    Ok(())
}
