//! Selection tests with a fixed-score stub and the real estimator

use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;
use crate::logic::error::SelectionError;

/// Returns preset scores regardless of data
struct FixedScores(Vec<f64>);

impl RelevanceScorer for FixedScores {
    fn name(&self) -> &str {
        "fixed"
    }

    fn score_columns(&self, _features: ArrayView2<f64>, _labels: &[usize]) -> Vec<f64> {
        self.0.clone()
    }
}

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("f{}", i)).collect()
}

#[test]
fn test_ranking_is_descending_and_stable_on_ties() {
    let x = Array2::<f64>::zeros((4, 5));
    let scorer = FixedScores(vec![0.3, 0.9, 0.3, 0.1, 0.9]);

    let ranking = rank_features(&names(5), x.view(), &[0, 1, 0, 1], &scorer);
    let order: Vec<usize> = ranking.iter().map(|f| f.index).collect();
    assert_eq!(order, vec![1, 4, 0, 2, 3]);
}

#[test]
fn test_top_k_then_threshold() {
    let x = Array2::<f64>::zeros((4, 6));
    let scorer = FixedScores(vec![0.5, 0.15, 0.8, 0.25, 0.05, 0.6]);
    let config = SelectionConfig { top_k: 4, min_score: 0.2 };

    let selection = select_features(&names(6), x.view(), &[0, 1, 0, 1], &scorer, &config).unwrap();

    assert_eq!(selection.ranking.len(), 4);
    assert_eq!(selection.selected.indices(), vec![2, 5, 0, 3]);
    assert_eq!(selection.selected.names(), vec!["f2", "f5", "f0", "f3"]);

    // Tighter K drops f3 even though it passes the threshold
    let config = SelectionConfig { top_k: 3, min_score: 0.2 };
    let selection = select_features(&names(6), x.view(), &[0, 1, 0, 1], &scorer, &config).unwrap();
    assert_eq!(selection.selected.indices(), vec![2, 5, 0]);
}

#[test]
fn test_size_bounds() {
    let x = Array2::<f64>::zeros((2, 8));
    let scores = vec![0.9, 0.1, 0.4, 0.21, 0.19, 0.7, 0.0, 0.3];
    let passing = scores.iter().filter(|&&s| s >= 0.2).count();

    for top_k in 1..=10 {
        let config = SelectionConfig { top_k, min_score: 0.2 };
        let selection =
            select_features(&names(8), x.view(), &[0, 1], &FixedScores(scores.clone()), &config)
                .unwrap();
        assert!(selection.selected.len() <= top_k);
        assert!(selection.selected.len() <= passing);
        assert!(selection.selected.iter().all(|f| f.score >= 0.2));
    }
}

#[test]
fn test_fewer_columns_than_k_and_empty_result() {
    let x = Array2::<f64>::zeros((2, 3));
    let config = SelectionConfig::default();

    let all = select_features(&names(3), x.view(), &[0, 1], &FixedScores(vec![0.5, 0.6, 0.7]), &config)
        .unwrap();
    assert_eq!(all.ranking.len(), 3);
    assert_eq!(all.selected.len(), 3);

    let none = select_features(&names(3), x.view(), &[0, 1], &FixedScores(vec![0.01, 0.0, 0.1]), &config)
        .unwrap();
    assert!(none.selected.is_empty());
}

#[test]
fn test_invalid_configs() {
    let x = Array2::<f64>::zeros((2, 3));
    let scorer = FixedScores(vec![0.5; 3]);

    let err = select_features(&names(3), x.view(), &[0, 1], &scorer, &SelectionConfig { top_k: 0, min_score: 0.2 })
        .unwrap_err();
    assert!(matches!(err, SelectionError::ZeroTopK));

    let empty = Array2::<f64>::zeros((2, 0));
    let err = select_features(&[], empty.view(), &[0, 1], &FixedScores(vec![]), &SelectionConfig::default())
        .unwrap_err();
    assert!(matches!(err, SelectionError::NoColumns));
}

#[test]
fn test_projection_follows_selection_order() {
    let x = Array2::from_shape_vec((2, 3), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    let set = SelectedFeatureSet::new(vec![
        FeatureScore { index: 2, name: "c".into(), score: 0.9 },
        FeatureScore { index: 0, name: "a".into(), score: 0.5 },
    ]);

    let projected = set.project(x.view()).unwrap();
    assert_eq!(projected, Array2::from_shape_vec((2, 2), vec![3.0, 1.0, 6.0, 4.0]).unwrap());
    assert_eq!(set.project_row(x.row(1)).unwrap(), vec![6.0, 4.0]);

    let narrow = Array2::<f64>::zeros((1, 2));
    assert!(set.project(narrow.view()).is_err());
}

#[test]
fn test_mutual_information_is_deterministic_and_finds_signal() {
    let n = 120;
    let labels: Vec<usize> = (0..n).map(|i| (i / 3) % 2).collect();
    let mut rng = StdRng::seed_from_u64(42);
    let mut x = Array2::<f64>::zeros((n, 3));
    for i in 0..n {
        x[[i, 0]] = rng.gen_range(0.0..100.0); // unrelated to label
        x[[i, 1]] = labels[i] as f64 * 50.0 + (i % 11) as f64;
        x[[i, 2]] = 3.0; // constant
    }

    let scorer = MutualInformation::default();
    let first = scorer.score_columns(x.view(), &labels);
    let second = scorer.score_columns(x.view(), &labels);
    assert_eq!(first, second);

    assert!(first[1] > 0.5, "signal column scored {}", first[1]);
    assert!(first[0] < 0.2, "noise column scored {}", first[0]);
    assert!(first[2] < 0.2, "constant column scored {}", first[2]);
    assert!(first.iter().all(|&s| s >= 0.0));
}
