//! Isolation Forest anomaly scoring.
//!
//! Each tree isolates points with random axis-aligned splits on a subsample
//! of the rows. Anomalies sit close to the root, so their average path length
//! is short and their score `2^(-E[h(x)] / c(n))` approaches 1.

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use tracing::debug;

const EULER_GAMMA: f64 = 0.577_215_664_9;

#[derive(Debug, Clone)]
enum IsolationTree {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<IsolationTree>,
        right: Box<IsolationTree>,
    },
}

/// A fitted isolation forest.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
}

impl IsolationForest {
    /// Grow `n_trees` trees, each on `min(max_samples, n_rows)` rows drawn
    /// without replacement. The same seed always yields the same forest.
    pub fn fit(data: &Array2<f64>, n_trees: usize, max_samples: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let sample_size = data.nrows().min(max_samples);
        let max_depth = if sample_size > 1 {
            (sample_size as f64).log2().ceil() as usize
        } else {
            0
        };

        let mut trees = Vec::with_capacity(n_trees);
        for i in 0..n_trees {
            let rows = index::sample(&mut rng, data.nrows(), sample_size).into_vec();
            trees.push(build_tree(data, rows, 0, max_depth, &mut rng));

            if i % 25 == 0 {
                debug!(tree = i + 1, n_trees, "isolation tree built");
            }
        }

        Self { trees, sample_size }
    }

    /// Anomaly score of one sample, in (0, 1]. Higher is more anomalous.
    pub fn score(&self, sample: ArrayView1<f64>) -> f64 {
        let normalizer = average_path_length(self.sample_size);
        if self.trees.is_empty() || normalizer == 0.0 {
            return 0.5;
        }

        let mean_depth = self
            .trees
            .iter()
            .map(|tree| path_length(tree, &sample, 0))
            .sum::<f64>()
            / self.trees.len() as f64;

        2.0_f64.powf(-mean_depth / normalizer)
    }

    /// Scores of every row of `data`.
    pub fn score_samples(&self, data: &Array2<f64>) -> Vec<f64> {
        data.outer_iter().map(|row| self.score(row)).collect()
    }
}

/// Flag the rows whose score lies strictly above the `1 - contamination`
/// quantile of all scores.
pub fn flag_outliers(scores: &[f64], contamination: f64) -> Vec<bool> {
    let threshold = quantile(scores, 1.0 - contamination);
    scores.iter().map(|&score| score > threshold).collect()
}

fn build_tree(
    data: &Array2<f64>,
    rows: Vec<usize>,
    depth: usize,
    max_depth: usize,
    rng: &mut StdRng,
) -> IsolationTree {
    if depth >= max_depth || rows.len() <= 1 {
        return IsolationTree::Leaf { size: rows.len() };
    }

    // Only features that still vary within this node can split it
    let candidates: Vec<(usize, f64, f64)> = (0..data.ncols())
        .filter_map(|feature| {
            let (min, max) = rows.iter().map(|&row| data[[row, feature]]).fold(
                (f64::INFINITY, f64::NEG_INFINITY),
                |(min, max), v| (min.min(v), max.max(v)),
            );
            (min.is_finite() && max.is_finite() && max > min).then_some((feature, min, max))
        })
        .collect();

    if candidates.is_empty() {
        return IsolationTree::Leaf { size: rows.len() };
    }

    let (feature, min, max) = candidates[rng.gen_range(0..candidates.len())];
    // Interpolate rather than `gen_range(min..max)`: `max - min` overflows for ±f64::MAX
    let u: f64 = rng.gen();
    let threshold = (min * (1.0 - u) + max * u).clamp(min, max);
    let (left, right): (Vec<usize>, Vec<usize>) = rows
        .into_iter()
        .partition(|&row| data[[row, feature]] <= threshold);

    IsolationTree::Split {
        feature,
        threshold,
        left: Box::new(build_tree(data, left, depth + 1, max_depth, rng)),
        right: Box::new(build_tree(data, right, depth + 1, max_depth, rng)),
    }
}

fn path_length(tree: &IsolationTree, sample: &ArrayView1<f64>, depth: usize) -> f64 {
    match tree {
        IsolationTree::Leaf { size } => depth as f64 + average_path_length(*size),
        IsolationTree::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            if sample[*feature] <= *threshold {
                path_length(left, sample, depth + 1)
            } else {
                path_length(right, sample, depth + 1)
            }
        }
    }
}

/// Average path length of an unsuccessful BST search among `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Quantile with linear interpolation between closest ranks.
fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}
