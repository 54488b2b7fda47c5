use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::features::{FeatureVector, FEATURE_LEN};
use crate::training::TrainError;

/// Defaults match the served model's training run: 100 bagged trees,
/// fixed seed 42.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub trees: usize,
    pub max_depth: usize,
    pub min_leaf: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            trees: 100,
            max_depth: 8,
            min_leaf: 2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        value: f32,
    },
    Split {
        feature: usize,
        threshold: f32,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Bagged regression forest over the 8-feature wellness vector.
/// Immutable once fitted; `predict` takes `&self` and shares no state,
/// so concurrent callers need no locking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellnessModel {
    trees: Vec<Node>,
}

impl WellnessModel {
    /// Fit is deterministic for a fixed seed and training set: each
    /// tree's bootstrap sample comes from an rng seeded by
    /// `(seed, tree index)`, and trees are collected in index order
    /// even though they are grown in parallel.
    pub fn fit(samples: &[(FeatureVector, f32)], config: &ForestConfig) -> Result<Self, TrainError> {
        if samples.is_empty() {
            return Err(TrainError::EmptySet);
        }

        let trees: Vec<Node> = (0..config.trees.max(1))
            .into_par_iter()
            .map(|tree_index| {
                let mut rng = StdRng::seed_from_u64(tree_seed(config.seed, tree_index));
                let indices: Vec<usize> = (0..samples.len())
                    .map(|_| rng.random_range(0..samples.len()))
                    .collect();
                grow(samples, &indices, 0, config)
            })
            .collect();

        Ok(Self { trees })
    }

    pub fn predict(&self, features: &FeatureVector) -> f32 {
        let sum: f32 = self
            .trees
            .iter()
            .map(|tree| predict_node(tree, features.as_slice()))
            .sum();
        sum / self.trees.len() as f32
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

fn tree_seed(seed: u64, tree_index: usize) -> u64 {
    seed.wrapping_add((tree_index as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15))
}

fn predict_node(mut node: &Node, features: &[f32]) -> f32 {
    loop {
        match node {
            Node::Leaf { value } => return *value,
            Node::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                node = if features[*feature] < *threshold {
                    left
                } else {
                    right
                };
            }
        }
    }
}

fn mean_label(samples: &[(FeatureVector, f32)], indices: &[usize]) -> f32 {
    let sum: f64 = indices.iter().map(|&i| f64::from(samples[i].1)).sum();
    (sum / indices.len() as f64) as f32
}

struct Split {
    feature: usize,
    threshold: f32,
    sse: f64,
}

/// Exhaustive variance-reduction split search: for every feature, sort
/// the node's samples by value and scan candidate cut points with
/// running sums, keeping the split with the lowest summed squared
/// error. Returns `None` when no cut point separates the samples.
fn best_split(samples: &[(FeatureVector, f32)], indices: &[usize], min_leaf: usize) -> Option<Split> {
    let n = indices.len();
    let mut best: Option<Split> = None;

    for feature in 0..FEATURE_LEN {
        let mut pairs: Vec<(f32, f64)> = indices
            .iter()
            .map(|&i| (samples[i].0.as_slice()[feature], f64::from(samples[i].1)))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let total_sum: f64 = pairs.iter().map(|p| p.1).sum();
        let total_sq: f64 = pairs.iter().map(|p| p.1 * p.1).sum();
        let mut left_sum = 0.0f64;
        let mut left_sq = 0.0f64;

        for k in 1..n {
            let (value, label) = pairs[k - 1];
            left_sum += label;
            left_sq += label * label;

            if k < min_leaf || n - k < min_leaf {
                continue;
            }
            if value == pairs[k].0 {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / k as f64)
                + (right_sq - right_sum * right_sum / (n - k) as f64);

            if best.as_ref().map_or(true, |b| sse < b.sse) {
                best = Some(Split {
                    feature,
                    threshold: (value + pairs[k].0) / 2.0,
                    sse,
                });
            }
        }
    }

    best
}

fn grow(
    samples: &[(FeatureVector, f32)],
    indices: &[usize],
    depth: usize,
    config: &ForestConfig,
) -> Node {
    let mean = mean_label(samples, indices);

    if depth >= config.max_depth || indices.len() < 2 * config.min_leaf {
        return Node::Leaf { value: mean };
    }
    let first_label = samples[indices[0]].1;
    if indices.iter().all(|&i| samples[i].1 == first_label) {
        return Node::Leaf { value: first_label };
    }

    let Some(split) = best_split(samples, indices, config.min_leaf) else {
        return Node::Leaf { value: mean };
    };

    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| samples[i].0.as_slice()[split.feature] < split.threshold);

    if left_indices.is_empty() || right_indices.is_empty() {
        return Node::Leaf { value: mean };
    }

    Node::Split {
        feature: split.feature,
        threshold: split.threshold,
        left: Box::new(grow(samples, &left_indices, depth + 1, config)),
        right: Box::new(grow(samples, &right_indices, depth + 1, config)),
    }
}
