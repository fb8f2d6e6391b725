//! Features Module - Feature Relevance & Selection
//!
//! Scores flow-feature columns against the label and keeps the
//! informative ones. The scorer sits behind [`RelevanceScorer`] so the
//! estimator can be swapped without touching the selector.

pub mod mutual_info;
pub mod selector;

#[cfg(test)]
mod tests;

use ndarray::ArrayView2;

pub use mutual_info::MutualInformation;
pub use selector::{
    rank_features, render_ranking, select_features, FeatureScore, FeatureSelection,
    SelectedFeatureSet, SelectionConfig,
};

/// Trait for column relevance estimators
pub trait RelevanceScorer {
    fn name(&self) -> &str;

    /// One non-negative score per column of `features`
    fn score_columns(&self, features: ArrayView2<f64>, labels: &[usize]) -> Vec<f64>;
}
