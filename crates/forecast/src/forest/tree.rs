//! CART decision tree with Gini impurity
//!
//! Nodes live in a flat arena; the root is index 0 and children always
//! come after their parent.

use rand::rngs::StdRng;
use rand::seq::index;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Rows with `row[feature] <= threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Class probabilities, indexed like the forest's class list
    Leaf { probabilities: Vec<f64> },
}

/// Growth limits for one tree
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: usize,
    /// Candidate features tried at each split
    pub max_features: usize,
    pub min_samples_split: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

/// Borrowed training matrix: rows of features and class indices
pub(crate) struct Samples<'a> {
    pub rows: &'a [Vec<f64>],
    pub labels: &'a [usize],
    pub n_classes: usize,
}

struct Builder<'a, 'r> {
    samples: &'a Samples<'a>,
    params: TreeParams,
    rng: &'r mut StdRng,
    nodes: Vec<Node>,
    /// Weighted impurity decrease per feature
    importances: Vec<f64>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity_decrease: f64,
}

pub(crate) fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

impl DecisionTree {
    /// Grow a tree over `indices` (a bootstrap sample, repeats allowed)
    ///
    /// Returns the tree and its unnormalized impurity-decrease importances.
    pub(crate) fn fit(
        samples: &Samples<'_>,
        indices: Vec<usize>,
        params: TreeParams,
        rng: &mut StdRng,
    ) -> (Self, Vec<f64>) {
        let n_features = samples.rows.first().map(|r| r.len()).unwrap_or(0);
        let mut builder = Builder {
            samples,
            params,
            rng,
            nodes: Vec::new(),
            importances: vec![0.0; n_features],
        };
        builder.grow(indices, 0);
        (
            Self {
                nodes: builder.nodes,
            },
            builder.importances,
        )
    }

    /// Class probabilities for one row
    pub fn predict_proba(&self, row: &[f64]) -> &[f64] {
        let mut at = 0;
        loop {
            match self.nodes.get(at) {
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row.get(*feature).copied().unwrap_or(0.0);
                    at = if value <= *threshold { *left } else { *right };
                }
                Some(Node::Leaf { probabilities }) => return probabilities,
                None => return &[],
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Deepest root-to-leaf path, in edges
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], at: usize) -> usize {
            match nodes.get(at) {
                Some(Node::Split { left, right, .. }) => 1 + walk(nodes, *left).max(walk(nodes, *right)),
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    /// Structural check for trees read back from disk
    pub(crate) fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("empty tree".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= n_features {
                        return Err(format!("node {} splits on feature {}", i, feature));
                    }
                    if *left <= i || *right <= i || *left >= self.nodes.len() || *right >= self.nodes.len() {
                        return Err(format!("node {} has invalid children", i));
                    }
                }
                Node::Leaf { probabilities } => {
                    if probabilities.len() != n_classes {
                        return Err(format!(
                            "leaf {} has {} probabilities for {} classes",
                            i,
                            probabilities.len(),
                            n_classes
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

impl Builder<'_, '_> {
    fn class_counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.samples.n_classes];
        for &i in indices {
            counts[self.samples.labels[i]] += 1;
        }
        counts
    }

    fn leaf(&mut self, counts: &[usize], total: usize) -> usize {
        let probabilities = counts
            .iter()
            .map(|&c| if total > 0 { c as f64 / total as f64 } else { 0.0 })
            .collect();
        self.nodes.push(Node::Leaf { probabilities });
        self.nodes.len() - 1
    }

    fn grow(&mut self, indices: Vec<usize>, depth: usize) -> usize {
        let counts = self.class_counts(&indices);
        let total = indices.len();
        let impurity = gini(&counts, total);

        if depth >= self.params.max_depth
            || total < self.params.min_samples_split
            || impurity <= 0.0
        {
            return self.leaf(&counts, total);
        }

        let Some(best) = self.best_split(&indices, impurity) else {
            return self.leaf(&counts, total);
        };

        let rows = self.samples.rows;
        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| rows[i][best.feature] <= best.threshold);

        self.importances[best.feature] += best.impurity_decrease;

        // Reserve the split slot so children get higher indices
        let at = self.nodes.len();
        self.nodes.push(Node::Leaf {
            probabilities: Vec::new(),
        });
        let left = self.grow(left_idx, depth + 1);
        let right = self.grow(right_idx, depth + 1);
        self.nodes[at] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        at
    }

    fn best_split(&mut self, indices: &[usize], parent_impurity: f64) -> Option<BestSplit> {
        let n_features = self.importances.len();
        if n_features == 0 {
            return None;
        }
        let k = self.params.max_features.clamp(1, n_features);
        // Features are drawn in random order until `k` non-constant ones have
        // been evaluated; constant features do not count toward `k`
        let order = index::sample(&mut *self.rng, n_features, n_features);

        let total = indices.len();
        let mut best: Option<BestSplit> = None;
        let mut sorted: Vec<usize> = indices.to_vec();
        let mut visited = 0;

        for feature in order.iter() {
            if visited >= k {
                break;
            }
            let rows = self.samples.rows;
            sorted.sort_by(|&a, &b| rows[a][feature].total_cmp(&rows[b][feature]));
            if rows[sorted[0]][feature] >= rows[sorted[total - 1]][feature] {
                continue;
            }
            visited += 1;

            let mut left = vec![0usize; self.samples.n_classes];
            let mut right = self.class_counts(&sorted);

            for split in 1..total {
                let moved = sorted[split - 1];
                let label = self.samples.labels[moved];
                left[label] += 1;
                right[label] -= 1;

                let lo = rows[moved][feature];
                let hi = rows[sorted[split]][feature];
                if lo >= hi {
                    continue;
                }

                let n_left = split;
                let n_right = total - split;
                let weighted = (n_left as f64 * gini(&left, n_left)
                    + n_right as f64 * gini(&right, n_right))
                    / total as f64;
                let decrease = parent_impurity - weighted;

                if decrease > 1e-12
                    && best
                        .as_ref()
                        .map_or(true, |b| decrease > b.impurity_decrease)
                {
                    let mut threshold = lo + (hi - lo) / 2.0;
                    if threshold >= hi || !threshold.is_finite() {
                        threshold = lo;
                    }
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        impurity_decrease: decrease,
                    });
                }
            }
        }

        // Importance is weighted by the samples reaching the node
        best.map(|mut b| {
            b.impurity_decrease *= total as f64;
            b
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn params() -> TreeParams {
        TreeParams {
            max_depth: 10,
            max_features: 2,
            min_samples_split: 2,
        }
    }

    #[test]
    fn test_gini() {
        assert_eq!(gini(&[5, 5], 10), 0.5);
        assert_eq!(gini(&[10, 0], 10), 0.0);
        assert_eq!(gini(&[0, 0], 0), 0.0);
    }

    #[test]
    fn test_separable_data_is_learned() {
        let rows: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64, 0.0]).collect();
        let labels: Vec<usize> = (0..20).map(|i| usize::from(i >= 10)).collect();
        let samples = Samples {
            rows: &rows,
            labels: &labels,
            n_classes: 2,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let (tree, importances) = DecisionTree::fit(&samples, (0..20).collect(), params(), &mut rng);

        assert_eq!(tree.predict_proba(&[3.0, 0.0]), &[1.0, 0.0]);
        assert_eq!(tree.predict_proba(&[15.0, 0.0]), &[0.0, 1.0]);
        assert_eq!(tree.depth(), 1);
        assert!(importances[0] > 0.0);
        assert_eq!(importances[1], 0.0);
        assert!(tree.validate(2, 2).is_ok());
    }

    #[test]
    fn test_pure_node_is_leaf() {
        let rows = vec![vec![1.0], vec![2.0], vec![3.0]];
        let labels = vec![0, 0, 0];
        let samples = Samples {
            rows: &rows,
            labels: &labels,
            n_classes: 1,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let (tree, _) = DecisionTree::fit(&samples, vec![0, 1, 2], params(), &mut rng);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict_proba(&[9.0]), &[1.0]);
    }

    #[test]
    fn test_depth_limit() {
        // Alternating labels need many splits
        let rows: Vec<Vec<f64>> = (0..64).map(|i| vec![i as f64]).collect();
        let labels: Vec<usize> = (0..64).map(|i| i % 2).collect();
        let samples = Samples {
            rows: &rows,
            labels: &labels,
            n_classes: 2,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let limited = TreeParams {
            max_depth: 3,
            ..params()
        };
        let (tree, _) = DecisionTree::fit(&samples, (0..64).collect(), limited, &mut rng);
        assert!(tree.depth() <= 3);
    }

    #[test]
    fn test_constant_features_make_a_leaf() {
        let rows = vec![vec![1.0, 1.0]; 6];
        let labels = vec![0, 1, 0, 1, 0, 1];
        let samples = Samples {
            rows: &rows,
            labels: &labels,
            n_classes: 2,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let (tree, _) = DecisionTree::fit(&samples, (0..6).collect(), params(), &mut rng);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict_proba(&[1.0, 1.0]), &[0.5, 0.5]);
    }
}
