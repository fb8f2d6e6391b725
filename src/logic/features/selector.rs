//! Feature Selector
//!
//! Ranks every column with a [`RelevanceScorer`], keeps the top-K and
//! then drops anything below the minimum score.

use std::fmt::Write as _;

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::RelevanceScorer;
use crate::constants::{DEFAULT_MIN_SCORE, DEFAULT_TOP_K};
use crate::logic::error::{ModelError, SelectionError};

/// Selection parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Columns kept after ranking
    pub top_k: usize,
    /// Minimum score among the kept columns
    pub min_score: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            min_score: DEFAULT_MIN_SCORE,
        }
    }
}

/// One column's relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScore {
    /// Column position in the cleaned dataset
    pub index: usize,
    pub name: String,
    pub score: f64,
}

/// Ordered set of retained columns (highest score first)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectedFeatureSet {
    features: Vec<FeatureScore>,
}

impl SelectedFeatureSet {
    pub fn new(features: Vec<FeatureScore>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureScore> {
        self.features.iter()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.features.iter().map(|f| f.index).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }

    /// Keep only the selected columns, in selection order
    pub fn project(&self, features: ArrayView2<f64>) -> Result<Array2<f64>, ModelError> {
        self.check_source_width(features.ncols())?;
        Ok(features.select(Axis(1), &self.indices()))
    }

    /// Project a single full-width row
    pub fn project_row(&self, row: ArrayView1<f64>) -> Result<Vec<f64>, ModelError> {
        self.check_source_width(row.len())?;
        Ok(self.features.iter().map(|f| row[f.index]).collect())
    }

    fn check_source_width(&self, width: usize) -> Result<(), ModelError> {
        let needed = self.features.iter().map(|f| f.index + 1).max().unwrap_or(0);
        if width < needed {
            return Err(ModelError::ShapeMismatch {
                context: "feature projection source",
                expected: needed,
                found: width,
            });
        }
        Ok(())
    }
}

/// Ranking plus the filtered selection
#[derive(Debug, Clone)]
pub struct FeatureSelection {
    /// Top-K before threshold filtering
    pub ranking: Vec<FeatureScore>,
    pub selected: SelectedFeatureSet,
}

/// Score every column, highest first; ties keep column order
pub fn rank_features(
    names: &[String],
    features: ArrayView2<f64>,
    labels: &[usize],
    scorer: &dyn RelevanceScorer,
) -> Vec<FeatureScore> {
    let scores = scorer.score_columns(features, labels);

    let mut ranked: Vec<FeatureScore> = scores
        .into_iter()
        .enumerate()
        .map(|(index, score)| FeatureScore {
            index,
            name: names.get(index).cloned().unwrap_or_else(|| format!("column_{}", index)),
            score: if score.is_nan() { 0.0 } else { score },
        })
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

/// Rank, keep top-K, drop scores below the threshold
pub fn select_features(
    names: &[String],
    features: ArrayView2<f64>,
    labels: &[usize],
    scorer: &dyn RelevanceScorer,
    config: &SelectionConfig,
) -> Result<FeatureSelection, SelectionError> {
    if config.top_k == 0 {
        return Err(SelectionError::ZeroTopK);
    }
    if features.ncols() == 0 {
        return Err(SelectionError::NoColumns);
    }

    log::info!(
        "Scoring {} columns with {} (top_k={}, min_score={})",
        features.ncols(),
        scorer.name(),
        config.top_k,
        config.min_score
    );

    let mut ranking = rank_features(names, features, labels, scorer);
    ranking.truncate(config.top_k);

    let selected: Vec<FeatureScore> = ranking
        .iter()
        .filter(|f| f.score >= config.min_score)
        .cloned()
        .collect();

    log::info!("Top {} features:\n{}", ranking.len(), render_ranking(&ranking));
    log::info!(
        "Selected {} of {} ranked features ({} below {})",
        selected.len(),
        ranking.len(),
        ranking.len() - selected.len(),
        config.min_score
    );

    Ok(FeatureSelection {
        ranking,
        selected: SelectedFeatureSet::new(selected),
    })
}

/// Score table as printed after selection
pub fn render_ranking(ranking: &[FeatureScore]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>4}  {:<40} {:>8}", "col", "feature", "score");
    for f in ranking {
        let _ = writeln!(out, "{:>4}  {:<40} {:>8.4}", f.index, f.name, f.score);
    }
    out
}
