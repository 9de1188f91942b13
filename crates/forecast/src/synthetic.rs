//! Seeded synthetic training data
//!
//! Used when the store holds too little history to train on. Sales are a
//! weighted sum of activity counts plus Gaussian noise, and an example is
//! labelled HIT at 90% of target.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use salesai_config::constants::training::{SYNTHETIC_HIT_RATIO, SYNTHETIC_WINDOW_DAYS};
use salesai_config::TrainingConfig;
use salesai_core::{ActivityCounts, FeatureVector};

use crate::training::TrainingExample;

const SALES_NOISE_STD: f64 = 50_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticDataGenerator {
    pub samples: usize,
    pub seed: u64,
}

impl Default for SyntheticDataGenerator {
    fn default() -> Self {
        Self::from_config(&TrainingConfig::default())
    }
}

impl SyntheticDataGenerator {
    pub fn new(samples: usize, seed: u64) -> Self {
        Self { samples, seed }
    }

    pub fn from_config(config: &TrainingConfig) -> Self {
        Self::new(config.synthetic_samples, config.synthetic_seed)
    }

    /// Same seed and sample count give an identical set
    pub fn generate(&self) -> Vec<TrainingExample> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        (0..self.samples).map(|_| Self::example(&mut rng)).collect()
    }

    fn example(rng: &mut StdRng) -> TrainingExample {
        let counts = ActivityCounts::new(
            rng.gen_range(50..150),
            rng.gen_range(20..60),
            rng.gen_range(15..50),
            rng.gen_range(5..25),
        );
        let monthly_target = rng.gen_range(300_000..800_000) as f64;

        let base = (counts.calls as f64 * 2_000.0
            + counts.meetings as f64 * 5_000.0
            + counts.leads as f64 * 8_000.0
            + counts.deals as f64 * 15_000.0)
            / 4.0;
        let noise: f64 = rng.sample::<f64, _>(StandardNormal) * SALES_NOISE_STD;
        let sales = (base + noise).max(0.0);

        TrainingExample {
            features: FeatureVector::from_counts(
                &counts,
                sales,
                monthly_target,
                SYNTHETIC_WINDOW_DAYS,
            ),
            label: synthetic_label(sales, monthly_target),
        }
    }
}

/// 1 when sales reach the synthetic share of target
pub fn synthetic_label(sales: f64, monthly_target: f64) -> u8 {
    u8::from(sales >= SYNTHETIC_HIT_RATIO * monthly_target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_is_identical() {
        let a = SyntheticDataGenerator::default().generate();
        let b = SyntheticDataGenerator::default().generate();
        assert_eq!(a.len(), 100);
        assert_eq!(a, b);

        let c = SyntheticDataGenerator::new(100, 7).generate();
        assert_ne!(a, c);
    }

    #[test]
    fn test_draws_stay_in_range() {
        for example in SyntheticDataGenerator::new(500, 1).generate() {
            let fv = example.features;
            assert!((50.0..150.0).contains(&fv.calls));
            assert!((20.0..60.0).contains(&fv.meetings));
            assert!((15.0..50.0).contains(&fv.leads));
            assert!((5.0..25.0).contains(&fv.deals));
            assert!((300_000.0..800_000.0).contains(&fv.monthly_target));
            assert!(fv.total_sales >= 0.0);
            assert_eq!(example.label, synthetic_label(fv.total_sales, fv.monthly_target));
            let total = fv.calls + fv.meetings + fv.leads + fv.deals;
            assert_eq!(fv.activity_velocity, total / 30.0);
        }
    }

    #[test]
    fn test_label_threshold_is_ninety_percent() {
        assert_eq!(synthetic_label(450_000.0, 500_000.0), 1);
        assert_eq!(synthetic_label(449_999.0, 500_000.0), 0);
    }
}
