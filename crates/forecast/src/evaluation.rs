//! Holdout split and classifier diagnostics

use std::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use salesai_core::{Error, Outcome, Result};

/// Seeded shuffle split of `0..n` into (train, test) index sets
///
/// The test side holds `ceil(n * test_fraction)` rows. Either side ending
/// up empty is a training error.
pub fn train_test_split(n: usize, test_fraction: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(Error::Training(format!(
            "test fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }
    let n_test = (n as f64 * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(Error::Training(format!(
            "cannot split {} examples with test fraction {}",
            n, test_fraction
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok((train, indices))
}

/// Fraction of matching labels
pub fn accuracy(truth: &[u8], predicted: &[u8]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    correct as f64 / truth.len() as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Per-class precision/recall/F1 for MISS and HIT plus averages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub miss: ClassMetrics,
    pub hit: ClassMetrics,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

impl ClassificationReport {
    pub fn from_predictions(truth: &[u8], predicted: &[u8]) -> Self {
        let miss = class_metrics(truth, predicted, Outcome::Miss.label());
        let hit = class_metrics(truth, predicted, Outcome::Hit.label());
        let support = miss.support + hit.support;

        let macro_avg = ClassMetrics {
            precision: (miss.precision + hit.precision) / 2.0,
            recall: (miss.recall + hit.recall) / 2.0,
            f1_score: (miss.f1_score + hit.f1_score) / 2.0,
            support,
        };

        let weighted = |f: fn(&ClassMetrics) -> f64| {
            if support == 0 {
                0.0
            } else {
                (f(&miss) * miss.support as f64 + f(&hit) * hit.support as f64) / support as f64
            }
        };
        let weighted_avg = ClassMetrics {
            precision: weighted(|m| m.precision),
            recall: weighted(|m| m.recall),
            f1_score: weighted(|m| m.f1_score),
            support,
        };

        Self {
            miss,
            hit,
            accuracy: accuracy(truth, predicted),
            macro_avg,
            weighted_avg,
        }
    }

    pub fn class(&self, outcome: Outcome) -> &ClassMetrics {
        match outcome {
            Outcome::Miss => &self.miss,
            Outcome::Hit => &self.hit,
        }
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, name: &str, m: &ClassMetrics) -> fmt::Result {
    writeln!(
        f,
        "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
        name, m.precision, m.recall, m.f1_score, m.support
    )
}

fn class_metrics(truth: &[u8], predicted: &[u8], class: u8) -> ClassMetrics {
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut fn_ = 0usize;
    for (t, p) in truth.iter().zip(predicted) {
        match (*t == class, *p == class) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
    }

    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1_score = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    ClassMetrics {
        precision,
        recall,
        f1_score,
        support: tp + fn_,
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>14} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        write_row(f, Outcome::Miss.as_str(), &self.miss)?;
        write_row(f, Outcome::Hit.as_str(), &self.hit)?;
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        write_row(f, "macro avg", &self.macro_avg)?;
        write_row(f, "weighted avg", &self.weighted_avg)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Pair column names with importances, most important first
pub fn rank_importances<S: AsRef<str>>(columns: &[S], importances: &[f64]) -> Vec<FeatureImportance> {
    let mut ranked: Vec<FeatureImportance> = columns
        .iter()
        .zip(importances)
        .map(|(c, i)| FeatureImportance {
            feature: c.as_ref().to_string(),
            importance: *i,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    ranked
}
