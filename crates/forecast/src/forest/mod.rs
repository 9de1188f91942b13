//! Random forest classifier
//!
//! Bagged CART trees: each tree sees a bootstrap sample of the rows and
//! draws `sqrt(n_features)` candidate features per split. Trees are grown
//! in parallel with rayon; tree `i` uses an RNG seeded with `seed + i`, so
//! a fit is reproducible regardless of thread scheduling.

mod tree;

pub use tree::{DecisionTree, Node, TreeParams};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use salesai_config::TrainingConfig;
use salesai_core::{Error, Result};

use tree::Samples;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self::from_config(&TrainingConfig::default())
    }
}

impl ForestParams {
    pub fn from_config(config: &TrainingConfig) -> Self {
        Self {
            n_trees: config.trees,
            max_depth: config.max_depth,
            min_samples_split: 2,
            seed: config.seed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RandomForest {
    /// Sorted class labels seen during fit; one or two of {0, 1}
    classes: Vec<u8>,
    n_features: usize,
    trees: Vec<DecisionTree>,
    /// Mean decrease in impurity per feature, sums to 1 (or all 0)
    feature_importances: Vec<f64>,
}

impl RandomForest {
    /// Fit on `rows` (equal-length feature rows) and binary `labels`
    pub fn fit(rows: &[Vec<f64>], labels: &[u8], params: &ForestParams) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::Training("no training rows".to_string()));
        }
        if rows.len() != labels.len() {
            return Err(Error::Training(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        let n_features = rows[0].len();
        if n_features == 0 || rows.iter().any(|r| r.len() != n_features) {
            return Err(Error::Training("feature rows must be non-empty and equal length".to_string()));
        }
        if params.n_trees == 0 || params.max_depth == 0 {
            return Err(Error::Training("forest needs at least one tree of depth one".to_string()));
        }

        let mut classes: Vec<u8> = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();
        let class_index: Vec<usize> = labels
            .iter()
            .map(|l| classes.binary_search(l).unwrap_or(0))
            .collect();

        let samples = Samples {
            rows,
            labels: &class_index,
            n_classes: classes.len(),
        };
        let tree_params = TreeParams {
            max_depth: params.max_depth,
            max_features: ((n_features as f64).sqrt() as usize).max(1),
            min_samples_split: params.min_samples_split.max(2),
        };
        let n = rows.len();

        let grown: Vec<(DecisionTree, Vec<f64>)> = (0..params.n_trees)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(i as u64));
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::fit(&samples, bootstrap, tree_params, &mut rng)
            })
            .collect();

        let mut importances = vec![0.0; n_features];
        let mut trees = Vec::with_capacity(grown.len());
        for (tree, raw) in grown {
            let total: f64 = raw.iter().sum();
            if total > 0.0 {
                for (acc, value) in importances.iter_mut().zip(&raw) {
                    *acc += value / total;
                }
            }
            trees.push(tree);
        }
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for value in &mut importances {
                *value /= total;
            }
        }

        Ok(Self {
            classes,
            n_features,
            trees,
            feature_importances: importances,
        })
    }

    /// Mean class probabilities across trees, indexed like [`Self::classes`]
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let mut acc = vec![0.0; self.classes.len()];
        if self.trees.is_empty() {
            return acc;
        }
        for tree in &self.trees {
            for (a, p) in acc.iter_mut().zip(tree.predict_proba(row)) {
                *a += p;
            }
        }
        let n = self.trees.len() as f64;
        for a in &mut acc {
            *a /= n;
        }
        acc
    }

    /// Most probable class label; the lower label wins ties
    pub fn predict(&self, row: &[f64]) -> u8 {
        let proba = self.predict_proba(row);
        let mut best = 0;
        for (i, p) in proba.iter().enumerate() {
            if *p > proba[best] {
                best = i;
            }
        }
        self.classes.get(best).copied().unwrap_or(0)
    }

    pub fn classes(&self) -> &[u8] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    /// Structural check for forests read back from disk
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.classes.is_empty() || self.classes.len() > 2 {
            return Err(format!("expected 1 or 2 classes, found {}", self.classes.len()));
        }
        if self.classes.windows(2).any(|w| w[0] >= w[1]) || self.classes.iter().any(|c| *c > 1) {
            return Err(format!("invalid class labels {:?}", self.classes));
        }
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        if self.feature_importances.len() != self.n_features {
            return Err("importance count does not match feature count".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.classes.len())
                .map_err(|e| format!("tree {}: {}", i, e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(n_trees: usize, seed: u64) -> ForestParams {
        ForestParams {
            n_trees,
            max_depth: 10,
            min_samples_split: 2,
            seed,
        }
    }

    /// Label is 1 when the first column exceeds 50; the rest is noise
    fn dataset() -> (Vec<Vec<f64>>, Vec<u8>) {
        let mut rng = StdRng::seed_from_u64(9);
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for _ in 0..200 {
            let signal: f64 = rng.gen_range(0.0..100.0);
            let row = vec![signal, rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0)];
            labels.push(u8::from(signal > 50.0));
            rows.push(row);
        }
        (rows, labels)
    }

    #[test]
    fn test_learns_threshold() {
        let (rows, labels) = dataset();
        let forest = RandomForest::fit(&rows, &labels, &params(25, 42)).unwrap();

        assert_eq!(forest.classes(), &[0, 1]);
        assert_eq!(forest.predict(&[90.0, 0.5, 0.5, 0.5]), 1);
        assert_eq!(forest.predict(&[10.0, 0.5, 0.5, 0.5]), 0);

        let proba = forest.predict_proba(&[95.0, 0.5, 0.5, 0.5]);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(proba[1] > 0.8);
    }

    #[test]
    fn test_signal_feature_dominates_importance() {
        let (rows, labels) = dataset();
        let forest = RandomForest::fit(&rows, &labels, &params(25, 42)).unwrap();
        let imp = forest.feature_importances();

        assert!((imp.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(imp[0] > imp[1] && imp[0] > imp[2] && imp[0] > imp[3]);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (rows, labels) = dataset();
        let a = RandomForest::fit(&rows, &labels, &params(10, 7)).unwrap();
        let b = RandomForest::fit(&rows, &labels, &params(10, 7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_class() {
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];
        let labels = vec![0, 0, 0];
        let forest = RandomForest::fit(&rows, &labels, &params(5, 1)).unwrap();

        assert_eq!(forest.classes(), &[0]);
        assert_eq!(forest.predict_proba(&[2.0, 2.0]), vec![1.0]);
        assert_eq!(forest.predict(&[2.0, 2.0]), 0);
        assert!(forest.feature_importances().iter().all(|v| *v == 0.0));
        assert!(forest.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(RandomForest::fit(&[], &[], &params(5, 1)).is_err());
        assert!(RandomForest::fit(&[vec![1.0]], &[0, 1], &params(5, 1)).is_err());
        assert!(RandomForest::fit(&[vec![1.0], vec![1.0, 2.0]], &[0, 1], &params(5, 1)).is_err());
    }
}
