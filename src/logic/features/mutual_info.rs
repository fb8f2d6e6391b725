//! Mutual Information Scorer
//!
//! k-nearest-neighbour estimate of I(X; Y) between one continuous feature
//! column and a discrete label (Ross, 2014). Columns are centred and scaled
//! to unit variance and receive a tiny seeded jitter so that tied values (very
//! common in flow statistics) do not collapse neighbour radii to zero.
//!
//! Everything is 1-D, so neighbour searches run on sorted copies of the
//! column instead of a KD-tree.

use std::collections::BTreeMap;

use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::RelevanceScorer;
use crate::logic::split::scaler::moments;

/// Neighbours used by the estimator
pub const DEFAULT_NEIGHBORS: usize = 3;

/// Jitter magnitude relative to max(1, mean |x|)
const JITTER_SCALE: f64 = 1e-10;

#[derive(Debug, Clone)]
pub struct MutualInformation {
    pub n_neighbors: usize,
    pub seed: u64,
}

impl Default for MutualInformation {
    fn default() -> Self {
        Self {
            n_neighbors: DEFAULT_NEIGHBORS,
            seed: 0,
        }
    }
}

impl MutualInformation {
    pub fn new(n_neighbors: usize, seed: u64) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1),
            seed,
        }
    }

    fn prepare_column(&self, column: ArrayView1<f64>, rng: &mut StdRng) -> Vec<f64> {
        let (mean, std) = moments(column.iter().copied()).unwrap_or((0.0, 0.0));
        let scale = if std > 0.0 && std.is_finite() { std } else { 1.0 };

        // Centred before scaling; the estimate only sees distances
        let scaled: Vec<f64> = column.iter().map(|&v| v / scale - mean / scale).collect();
        let magnitude = moments(scaled.iter().map(|v| v.abs()))
            .map_or(1.0, |(m, _)| m.max(1.0));

        scaled
            .into_iter()
            .map(|v| v + JITTER_SCALE * magnitude * standard_normal(rng))
            .collect()
    }
}

impl RelevanceScorer for MutualInformation {
    fn name(&self) -> &str {
        "mutual_info"
    }

    fn score_columns(&self, features: ArrayView2<f64>, labels: &[usize]) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(self.seed);

        features
            .columns()
            .into_iter()
            .map(|column| {
                let values = self.prepare_column(column, &mut rng);
                mutual_info_continuous_discrete(&values, labels, self.n_neighbors)
            })
            .collect()
    }
}

/// I(X; Y) for continuous `values` and discrete `labels`, clamped at 0
pub fn mutual_info_continuous_discrete(values: &[f64], labels: &[usize], k: usize) -> f64 {
    let n = values.len().min(labels.len());
    if n == 0 {
        return 0.0;
    }

    let mut by_label: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().take(n).enumerate() {
        by_label.entry(label).or_default().push(i);
    }

    if by_label.len() < 2 {
        return 0.0;
    }

    let mut radius = vec![0.0f64; n];
    let mut k_used = vec![0usize; n];
    let mut label_count = vec![0usize; n];

    for members in by_label.values() {
        let count = members.len();
        if count > 1 {
            let k_eff = k.min(count - 1);
            let mut sorted: Vec<f64> = members.iter().map(|&i| values[i]).collect();
            sorted.sort_by(f64::total_cmp);

            for &i in members {
                let distance = kth_neighbor_distance(&sorted, values[i], k_eff);
                radius[i] = next_toward_zero(distance);
                k_used[i] = k_eff;
            }
        }
        for &i in members {
            label_count[i] = count;
        }
    }

    // Points whose label is unique carry no neighbour information
    let kept: Vec<usize> = (0..n).filter(|&i| label_count[i] > 1).collect();
    if kept.is_empty() {
        return 0.0;
    }

    let mut all_sorted: Vec<f64> = kept.iter().map(|&i| values[i]).collect();
    all_sorted.sort_by(f64::total_cmp);

    let m = kept.len() as f64;
    let (mut sum_k, mut sum_label, mut sum_m) = (0.0, 0.0, 0.0);
    for &i in &kept {
        let within = count_within(&all_sorted, values[i], radius[i]);
        sum_k += digamma(k_used[i] as f64);
        sum_label += digamma(label_count[i] as f64);
        sum_m += digamma(within as f64);
    }

    let mi = digamma(m) + (sum_k - sum_label - sum_m) / m;
    if mi.is_finite() {
        mi.max(0.0)
    } else {
        0.0
    }
}

/// Distance from `value` (present in `sorted`) to its k-th nearest other point
fn kth_neighbor_distance(sorted: &[f64], value: f64, k: usize) -> f64 {
    let pos = sorted.partition_point(|&x| x < value);
    // Candidates are sorted[..left] and sorted[right..]; sorted[pos] is the point itself
    let mut left = pos;
    let mut right = pos + 1;
    let mut distance = 0.0;

    for _ in 0..k {
        let dl = if left > 0 { value - sorted[left - 1] } else { f64::INFINITY };
        let dr = if right < sorted.len() { sorted[right] - value } else { f64::INFINITY };
        if dl <= dr {
            distance = dl;
            left -= 1;
        } else {
            distance = dr;
            right += 1;
        }
        if distance.is_infinite() {
            break;
        }
    }
    distance
}

/// Points with |x - value| <= radius, including the point itself
fn count_within(sorted: &[f64], value: f64, radius: f64) -> usize {
    let lo = sorted.partition_point(|&x| value - x > radius);
    let hi = sorted.partition_point(|&x| x - value <= radius);
    hi.saturating_sub(lo).max(1)
}

/// Largest float strictly below `d` (for d > 0)
fn next_toward_zero(d: f64) -> f64 {
    if d > 0.0 && d.is_finite() {
        f64::from_bits(d.to_bits() - 1)
    } else {
        d
    }
}

fn standard_normal(rng: &mut StdRng) -> f64 {
    // Box-Muller; 1 - u keeps the log argument in (0, 1]
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Digamma via recurrence up to x >= 6 and the asymptotic series
pub fn digamma(mut x: f64) -> f64 {
    if x <= 0.0 {
        return f64::NAN;
    }
    let mut result = 0.0;
    while x < 6.0 {
        result -= 1.0 / x;
        x += 1.0;
    }
    let f = 1.0 / (x * x);
    result + x.ln()
        - 0.5 / x
        - f * (1.0 / 12.0 - f * (1.0 / 120.0 - f * (1.0 / 252.0 - f * (1.0 / 240.0 - f / 132.0))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digamma_known_values() {
        // psi(1) = -gamma
        assert!((digamma(1.0) + 0.577_215_664_901_532_9).abs() < 1e-10);
        // psi(n+1) = psi(n) + 1/n
        assert!((digamma(4.0) - digamma(3.0) - 1.0 / 3.0).abs() < 1e-12);
        assert!((digamma(100.0) - 4.600_161_852_738_087).abs() < 1e-10);
    }

    #[test]
    fn test_kth_neighbor_distance_skips_self() {
        let sorted = [0.0, 1.0, 1.5, 4.0, 10.0];
        assert_eq!(kth_neighbor_distance(&sorted, 1.0, 1), 0.5);
        assert_eq!(kth_neighbor_distance(&sorted, 1.0, 2), 1.0);
        assert_eq!(kth_neighbor_distance(&sorted, 1.0, 3), 3.0);
        assert_eq!(kth_neighbor_distance(&sorted, 10.0, 1), 6.0);
    }

    #[test]
    fn test_count_within_includes_boundary() {
        let sorted = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(count_within(&sorted, 1.0, 1.0), 3);
        assert_eq!(count_within(&sorted, 0.0, 0.0), 1);
    }

    #[test]
    fn test_separable_column_scores_near_ln2() {
        let labels: Vec<usize> = (0..200).map(|i| i % 2).collect();
        let values: Vec<f64> = (0..200)
            .map(|i| (i % 2) as f64 * 1000.0 + i as f64)
            .collect();

        let mi = mutual_info_continuous_discrete(&values, &labels, 3);
        assert!((mi - std::f64::consts::LN_2).abs() < 0.1, "mi = {}", mi);
    }

    #[test]
    fn test_huge_finite_column_is_bounded() {
        let column = ndarray::Array1::from_iter((0..60).map(|i| if i % 2 == 0 { 1e308 } else { 1.7e308 }));
        let labels: Vec<usize> = (0..60).map(|i| (i / 2) % 2).collect();
        let scorer = MutualInformation::default();
        let mut rng = StdRng::seed_from_u64(0);

        let values = scorer.prepare_column(column.view(), &mut rng);
        assert!(values.iter().all(|v| v.is_finite()));

        let mi = mutual_info_continuous_discrete(&values, &labels, 3);
        assert!((0.0..=std::f64::consts::LN_2 + 0.05).contains(&mi), "mi = {}", mi);
    }

    #[test]
    fn test_single_label_scores_zero() {
        let labels = vec![0usize; 50];
        let values: Vec<f64> = (0..50).map(|i| i as f64).collect();
        assert_eq!(mutual_info_continuous_discrete(&values, &labels, 3), 0.0);
    }
}
