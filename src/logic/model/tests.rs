use ndarray::{array, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;
use crate::logic::error::ModelError;
use crate::logic::features::{FeatureScore, SelectedFeatureSet};
use crate::logic::labels::LabelEncoder;
use crate::logic::split::StandardScaler;

fn quick_config(epochs: usize) -> TrainingConfig {
    TrainingConfig {
        hidden_layers: vec![16, 8],
        epochs,
        batch_size: 16,
        learning_rate: 0.01,
        seed: 3,
        model_dir: std::env::temp_dir(),
        checkpoint_dir: None,
    }
}

/// Two features, label = x0 + x1 > 0
fn separable(n: usize) -> (Array2<f32>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(11);
    let x = Array2::from_shape_fn((n, 2), |_| rng.gen_range(-1.0f32..1.0));
    let y = x.rows().into_iter().map(|r| usize::from(r[0] + r[1] > 0.0)).collect();
    (x, y)
}

fn preprocessing(width: usize) -> Preprocessing {
    let features = SelectedFeatureSet::new(
        (0..width)
            .map(|i| FeatureScore {
                index: i,
                name: format!("f{}", i),
                score: 1.0,
            })
            .collect(),
    );
    let reference = Array2::from_shape_fn((4, width), |(i, j)| (i + j) as f64);
    Preprocessing {
        features,
        scaler: StandardScaler::fit(reference.view()).unwrap(),
        labels: LabelEncoder::fit(&["BENIGN", "DDoS"]),
    }
}

// ============================================================================
// NETWORK
// ============================================================================

#[test]
fn test_network_shapes_and_summary() {
    let net = Network::new(5, &[64, 32], 2, 0).unwrap();
    assert_eq!(net.input_width(), 5);
    assert_eq!(net.output_width(), 2);
    assert_eq!(net.parameter_count(), 5 * 64 + 64 + 64 * 32 + 32 + 32 * 2 + 2);

    let out = net.forward(Array2::<f32>::zeros((3, 5)).view()).unwrap();
    assert_eq!(out.dim(), (3, 2));
    assert!(out.iter().all(|&s| s > 0.0 && s < 1.0));

    let summary = net.summary();
    assert!(summary.contains("dense_0"));
    assert!(summary.contains("sigmoid"));
}

#[test]
fn test_wrong_batch_width_is_rejected() {
    let net = Network::new(4, &[8], 2, 0).unwrap();
    let err = net.forward(Array2::<f32>::zeros((1, 3)).view()).unwrap_err();
    assert!(matches!(
        err,
        ModelError::ShapeMismatch { expected: 4, found: 3, .. }
    ));
}

#[test]
fn test_invalid_architecture() {
    assert!(matches!(Network::new(0, &[8], 2, 0), Err(ModelError::InvalidArchitecture(_))));
    assert!(matches!(Network::new(3, &[8, 0], 2, 0), Err(ModelError::InvalidArchitecture(_))));
}

#[test]
fn test_argmax_first_wins_on_tie() {
    let scores = array![[0.2f32, 0.8], [0.5, 0.5], [0.9, 0.1]];
    assert_eq!(argmax_rows(scores.view()), vec![1, 0, 0]);

    let p = Prediction::new(vec![0.1, 1.0]);
    assert_eq!(p.argmax(), 1);
    assert_eq!(p.attack_score(), 1.0);
    assert_eq!(Prediction::new(vec![0.3]).attack_score(), 0.0);
}

// ============================================================================
// TRAINING
// ============================================================================

#[test]
fn test_loss_normalizes_sigmoid_scores() {
    let uniform = sparse_categorical_crossentropy(&[0.5, 0.5], 0);
    assert!((uniform - std::f32::consts::LN_2).abs() < 1e-6);

    // [0.2, 0.6] renormalizes to [0.25, 0.75]
    let skewed = sparse_categorical_crossentropy(&[0.2, 0.6], 1);
    assert!((skewed - (-(0.75f32).ln())).abs() < 1e-5);

    // Zero score is clipped rather than producing infinity
    assert!(sparse_categorical_crossentropy(&[1.0, 0.0], 1).is_finite());
}

#[test]
fn test_training_learns_separable_data() {
    let (x, y) = separable(400);
    let mut net = Network::new(2, &[16, 8], 2, 3).unwrap();
    let config = quick_config(30);

    let history = Trainer::new(&config).unwrap().fit(&mut net, x.view(), &y).unwrap();

    assert_eq!(history.epochs.len(), 30);
    let first = history.epochs[0];
    let last = *history.last().unwrap();
    assert!(last.loss < first.loss, "loss {} -> {}", first.loss, last.loss);
    assert!(last.accuracy > 0.9, "final accuracy {}", last.accuracy);
}

#[test]
fn test_training_is_deterministic() {
    let (x, y) = separable(64);
    let config = quick_config(2);

    let mut a = Network::new(2, &[16, 8], 2, 3).unwrap();
    let mut b = Network::new(2, &[16, 8], 2, 3).unwrap();
    Trainer::new(&config).unwrap().fit(&mut a, x.view(), &y).unwrap();
    Trainer::new(&config).unwrap().fit(&mut b, x.view(), &y).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_training_rejects_bad_inputs() {
    let (x, y) = separable(10);
    let mut net = Network::new(2, &[4], 2, 0).unwrap();
    let trainer_config = quick_config(1);
    let trainer = Trainer::new(&trainer_config).unwrap();

    let mut bad_labels = y.clone();
    bad_labels[0] = 2;
    assert!(trainer.fit(&mut net, x.view(), &bad_labels).is_err());
    assert!(trainer.fit(&mut net, x.view(), &y[..5]).is_err());

    let zero_batch = TrainingConfig { batch_size: 0, ..quick_config(1) };
    assert!(matches!(Trainer::new(&zero_batch), Err(ModelError::InvalidTraining(_))));
}

// ============================================================================
// CHECKPOINTS
// ============================================================================

#[test]
fn test_checkpoint_per_epoch_and_restore() {
    let dir = tempfile::tempdir().unwrap();
    let (x, y) = separable(48);
    let config = TrainingConfig {
        checkpoint_dir: Some(dir.path().join("ckpt")),
        ..quick_config(3)
    };

    let mut trained = Network::new(2, &[16, 8], 2, 3).unwrap();
    Trainer::new(&config).unwrap().fit(&mut trained, x.view(), &y).unwrap();

    let writer = CheckpointWriter::new(dir.path().join("ckpt")).unwrap();
    for epoch in 1..=3 {
        assert!(writer.path_for(epoch).exists());
    }
    let latest = writer.latest().unwrap().unwrap();
    assert!(latest.ends_with("checkpoint-epoch-003.json"));

    let mut restored = Network::new(2, &[16, 8], 2, 99).unwrap();
    assert_eq!(restored.load_checkpoint(&latest).unwrap(), 3);
    assert_eq!(restored, trained);

    let mut other_shape = Network::new(2, &[5], 2, 0).unwrap();
    assert!(matches!(
        other_shape.load_checkpoint(&latest),
        Err(ModelError::ShapeMismatch { .. })
    ));
}

// ============================================================================
// ARTIFACTS
// ============================================================================

#[test]
fn test_artifact_asserts_widths() {
    let net = Network::new(3, &[4], 2, 0).unwrap();
    let err = ModelArtifact::new(net, preprocessing(2)).unwrap_err();
    assert!(matches!(err, ModelError::ShapeMismatch { expected: 2, found: 3, .. }));

    let (x, y) = separable(20);
    let err = ModelArtifact::train(&quick_config(1), x.view(), &y, preprocessing(3)).unwrap_err();
    assert!(matches!(err, ModelError::ShapeMismatch { expected: 3, found: 2, .. }));
}

#[test]
fn test_bundle_round_trip_and_checksum() {
    let dir = tempfile::tempdir().unwrap();
    let (x, y) = separable(32);
    let (artifact, _) = ModelArtifact::train(&quick_config(2), x.view(), &y, preprocessing(2)).unwrap();

    let bundle = dir.path().join("bundle");
    artifact.save_bundle(&bundle).unwrap();
    let loaded = ModelArtifact::load(&bundle).unwrap();

    assert_eq!(loaded.network(), artifact.network());
    assert_eq!(loaded.manifest().run_id, artifact.manifest().run_id);
    assert_eq!(loaded.features(), artifact.features());
    assert_eq!(
        loaded.infer(x.view()).unwrap(),
        artifact.infer(x.view()).unwrap()
    );

    // Tamper with one weight
    let weights_path = bundle.join(artifact::WEIGHTS_FILE);
    let mut weights: NetworkWeights =
        serde_json::from_slice(&std::fs::read(&weights_path).unwrap()).unwrap();
    weights.layers[0].weights[0] += 1.0;
    std::fs::write(&weights_path, serde_json::to_vec(&weights).unwrap()).unwrap();

    assert!(matches!(ModelArtifact::load(&bundle), Err(ModelError::Checksum { .. })));
}

#[test]
fn test_single_file_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let (x, y) = separable(32);
    let (artifact, _) = ModelArtifact::train(&quick_config(1), x.view(), &y, preprocessing(2)).unwrap();

    let path = dir.path().join("models").join("flow.json");
    artifact.save_file(&path).unwrap();
    let loaded = ModelArtifact::load(&path).unwrap();
    assert_eq!(loaded.network(), artifact.network());
    assert_eq!(loaded.labels().classes(), artifact.labels().classes());

    assert!(matches!(
        ModelArtifact::load(&dir.path().join("missing.json")),
        Err(ModelError::Io { .. })
    ));
}

#[test]
fn test_infer_row_matches_batch_path() {
    let (x, y) = separable(32);
    let (artifact, _) = ModelArtifact::train(&quick_config(1), x.view(), &y, preprocessing(2)).unwrap();

    let rows = array![[3.0f64, 1.5], [0.0, 4.0]];
    let batch = artifact.infer(artifact.prepare(rows.view()).unwrap().view()).unwrap();
    let single = artifact.infer_row(rows.row(1)).unwrap();

    assert_eq!(single, batch[1]);
    assert_eq!(predict_classes(&batch).len(), 2);
}
