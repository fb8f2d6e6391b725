//! Model Module - Flow Classifier
//!
//! Feed-forward network, its training loop, inference and on-disk
//! artifacts. Training and serving only meet through [`ModelArtifact`].

pub mod network;
pub mod train;
pub mod inference;
pub mod checkpoint;
pub mod artifact;

#[cfg(test)]
mod tests;

// Re-export common types
pub use artifact::{ModelArtifact, ModelManifest, Preprocessing};
pub use checkpoint::{Checkpoint, CheckpointWriter, NetworkWeights};
pub use inference::{predict_classes, Prediction, ATTACK_CLASS};
pub use network::{argmax_rows, Activation, LayerSpec, Network};
pub use train::{mean_loss, sparse_categorical_crossentropy, Trainer, TrainingConfig, TrainingHistory};
