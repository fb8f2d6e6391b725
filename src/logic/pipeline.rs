//! Pipeline - End-to-end Training and Scoring
//!
//! load → clean → select → encode → split → scale → train → evaluate,
//! then score one record and hand the prediction to the alert dispatcher.
//! Data and selection problems abort before any training starts.

use std::path::{Path, PathBuf};

use serde::Serialize;
use uuid::Uuid;

use crate::logic::config::AppConfig;
use crate::logic::dataset::{load_csv, CleaningStats, FlowDataset};
use crate::logic::error::{PipelineResult, SelectionError};
use crate::logic::evaluate::{evaluate_loss, EvaluationReport};
use crate::logic::features::{select_features, FeatureSelection, MutualInformation, RelevanceScorer};
use crate::logic::labels::LabelEncoder;
use crate::logic::model::{argmax_rows, ModelArtifact, Prediction, Preprocessing, TrainingHistory};
use crate::logic::response::{AlertDispatcher, DispatchReport};
use crate::logic::split::{scale_split, train_test_split};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Output of a training run, before anything is written to disk
pub struct TrainedPipeline {
    pub artifact: ModelArtifact,
    pub history: TrainingHistory,
    pub evaluation: EvaluationReport,
    pub selection: FeatureSelection,
    pub train_rows: usize,
    pub test_rows: usize,
}

/// One record scored by a trained model
#[derive(Debug, Serialize)]
pub struct SampleOutcome {
    pub row: usize,
    pub actual_label: String,
    pub predicted_label: String,
    pub prediction: Prediction,
    pub alert: String,
    #[serde(skip)]
    pub dispatch: DispatchReport,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub dataset_rows: usize,
    pub cleaning: CleaningStats,
    pub selected_features: Vec<String>,
    pub history: TrainingHistory,
    pub evaluation: EvaluationReport,
    pub model_path: PathBuf,
    /// `None` when the configured sample row is out of range
    pub sample: Option<SampleOutcome>,
}

// ============================================================================
// TRAINING
// ============================================================================

/// Fit every transform and the classifier on a cleaned dataset
pub fn train_pipeline(
    dataset: &FlowDataset,
    config: &AppConfig,
    scorer: &dyn RelevanceScorer,
) -> PipelineResult<TrainedPipeline> {
    let encoder = LabelEncoder::fit(dataset.labels());
    encoder.require_binary()?;
    let y = encoder.transform(dataset.labels())?;

    let selection = select_features(
        dataset.feature_names(),
        dataset.features(),
        &y,
        scorer,
        &config.pipeline.selection,
    )?;
    if selection.selected.is_empty() {
        return Err(SelectionError::Empty {
            candidates: selection.ranking.len(),
            min_score: config.pipeline.selection.min_score,
        }
        .into());
    }

    let x = selection.selected.project(dataset.features())?;
    let split = train_test_split(
        x.view(),
        &y,
        config.pipeline.test_fraction,
        config.pipeline.split_seed,
    )?;
    let scaled = scale_split(&split, config.pipeline.scaler_fit_mode)?;

    let x_train = scaled.x_train.mapv(|v| v as f32);
    let x_test = scaled.x_test.mapv(|v| v as f32);

    let preprocessing = Preprocessing {
        features: selection.selected.clone(),
        scaler: scaled.scaler,
        labels: encoder,
    };
    let (artifact, history) = ModelArtifact::train(&config.training, x_train.view(), &split.y_train, preprocessing)?;

    let scores = artifact.network().forward(x_test.view())?;
    let y_pred = argmax_rows(scores.view());
    let evaluation = evaluate_loss(scores.view(), &split.y_test, &y_pred)?;
    evaluation.log(artifact.labels().classes());

    Ok(TrainedPipeline {
        artifact,
        history,
        evaluation,
        selection,
        train_rows: split.y_train.len(),
        test_rows: split.y_test.len(),
    })
}

// ============================================================================
// SCORING
// ============================================================================

/// Score one cleaned dataset row and run the alert decision on it
pub fn score_sample(
    artifact: &ModelArtifact,
    dataset: &FlowDataset,
    row: usize,
    dispatcher: &AlertDispatcher,
) -> PipelineResult<SampleOutcome> {
    check_columns(artifact, dataset);

    let features = dataset.row(row)?;
    let prediction = artifact.infer_row(features)?;
    let predicted_label = artifact
        .labels()
        .decode(prediction.argmax())
        .unwrap_or("unknown")
        .to_string();
    let actual_label = dataset.labels()[row].clone();

    log::info!(
        "Row {}: scores {:?} → {} (actual {})",
        row,
        prediction.scores,
        predicted_label,
        actual_label
    );

    let dispatch = dispatcher.dispatch(&prediction);
    let alert = dispatch.summary();
    log::info!("Alert: {}", alert);

    Ok(SampleOutcome {
        row,
        actual_label,
        predicted_label,
        prediction,
        alert,
        dispatch,
    })
}

/// Warn when the dataset header differs from the one the model was trained on
fn check_columns(artifact: &ModelArtifact, dataset: &FlowDataset) {
    for feature in artifact.features().iter() {
        match dataset.feature_names().get(feature.index) {
            Some(name) if name == &feature.name => {}
            Some(name) => log::warn!(
                "Column {} is '{}' but the model expects '{}'",
                feature.index,
                name,
                feature.name
            ),
            None => log::warn!("Dataset has no column {} ('{}')", feature.index, feature.name),
        }
    }
}

// ============================================================================
// ENTRY POINTS
// ============================================================================

/// Full training run: train, save the bundle, score the sample row
pub fn run(config: &AppConfig, dispatcher: &AlertDispatcher) -> PipelineResult<RunReport> {
    log::info!("Loading dataset {}", config.pipeline.dataset_path.display());
    let (dataset, cleaning) = load_csv(&config.pipeline.dataset_path)?;
    log::info!(
        "Cleaned {} rows x {} features (inf replaced: {}, missing filled: {}, negatives clamped: {})",
        dataset.n_rows(),
        dataset.n_features(),
        cleaning.infinite_replaced,
        cleaning.missing_filled,
        cleaning.negatives_clamped
    );

    let trained = train_pipeline(&dataset, config, &MutualInformation::default())?;
    let model_path = trained.artifact.save_bundle(&config.training.model_dir)?;

    let sample_row = config.pipeline.demo_sample_row;
    let sample = if sample_row < dataset.n_rows() {
        Some(score_sample(&trained.artifact, &dataset, sample_row, dispatcher)?)
    } else {
        log::warn!(
            "Sample row {} is outside the dataset ({} rows), skipping the alert check",
            sample_row,
            dataset.n_rows()
        );
        None
    };

    Ok(RunReport {
        run_id: trained.artifact.manifest().run_id,
        dataset_rows: dataset.n_rows(),
        cleaning,
        selected_features: trained.selection.selected.names().into_iter().map(String::from).collect(),
        history: trained.history,
        evaluation: trained.evaluation,
        model_path,
        sample,
    })
}

/// Score one row with a saved model
pub fn predict_row(
    config: &AppConfig,
    artifact_path: &Path,
    row: usize,
    dispatcher: &AlertDispatcher,
) -> PipelineResult<SampleOutcome> {
    let artifact = ModelArtifact::load(artifact_path)?;
    let (dataset, _) = load_csv(&config.pipeline.dataset_path)?;
    score_sample(&artifact, &dataset, row, dispatcher)
}
