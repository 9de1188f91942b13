//! Centralized constants for sales forecasting
//!
//! Single source of truth for benchmark tables, thresholds and defaults.
//! `Settings` sections default to these values; code that needs a fixed
//! rule (risk bands, status tiers) reads them from here directly.

/// Industry conversion benchmarks (percent)
pub mod benchmarks {
    pub const CALLS_TO_LEADS: f64 = 25.0;
    pub const LEADS_TO_MEETINGS: f64 = 50.0;
    pub const MEETINGS_TO_DEALS: f64 = 60.0;
    pub const DEALS_TO_SALES: f64 = 70.0;
    pub const OVERALL: f64 = 8.0;
}

/// Conversion floors below which the metrics recommendation fires (percent)
///
/// Hand-tuned, independent of `benchmarks`.
pub mod recommendation_thresholds {
    pub const CALLS_TO_LEADS: f64 = 20.0;
    pub const LEADS_TO_MEETINGS: f64 = 40.0;
    pub const MEETINGS_TO_DEALS: f64 = 50.0;
    pub const DEALS_TO_SALES: f64 = 60.0;
}

/// Share of benchmark reached (percent) at which a stage enters each tier
pub mod stage_status {
    pub const EXCELLENT: f64 = 100.0;
    pub const GOOD: f64 = 80.0;
    pub const NEEDS_IMPROVEMENT: f64 = 60.0;
}

/// Overall conversion (percent) at which funnel health enters each tier
pub mod funnel_health {
    pub const EXCELLENT: f64 = 10.0;
    pub const GOOD: f64 = 5.0;
    pub const FAIR: f64 = 2.0;
}

/// Miss-probability bands for risk tiers
pub mod risk {
    pub const HIGH: f64 = 0.7;
    pub const MEDIUM: f64 = 0.4;
}

/// Base performance score weights and monthly activity targets
pub mod performance {
    pub const WEIGHT_CALLS: f64 = 0.15;
    pub const WEIGHT_MEETINGS: f64 = 0.25;
    pub const WEIGHT_LEADS: f64 = 0.20;
    pub const WEIGHT_DEALS: f64 = 0.20;
    pub const WEIGHT_SALES: f64 = 0.20;

    pub const TARGET_CALLS: u64 = 100;
    pub const TARGET_MEETINGS: u64 = 40;
    pub const TARGET_LEADS: u64 = 30;
    pub const TARGET_DEALS: u64 = 15;

    /// Overall score at which an agent enters each level
    pub const LEVEL_EXCELLENT: f64 = 80.0;
    pub const LEVEL_GOOD: f64 = 60.0;
    pub const LEVEL_AVERAGE: f64 = 40.0;
}

/// Training defaults
pub mod training {
    pub const TEST_FRACTION: f64 = 0.2;
    pub const SEED: u64 = 42;
    pub const TREES: usize = 100;
    pub const MAX_DEPTH: usize = 10;
    pub const TRAILING_MONTHS: u32 = 6;
    /// Fewer real examples than this switches to synthetic data
    pub const MIN_REAL_EXAMPLES: usize = 10;
    pub const SYNTHETIC_SAMPLES: usize = 100;
    pub const SYNTHETIC_SEED: u64 = 42;
    /// Synthetic examples count as HIT from this share of target
    pub const SYNTHETIC_HIT_RATIO: f64 = 0.9;
    pub const SYNTHETIC_WINDOW_DAYS: i64 = 30;
}

/// Filesystem defaults
pub mod paths {
    pub const MODEL_ARTIFACT: &str = "models/forecast_model.json";
    pub const DATASET: &str = "data/dataset.json";
    pub const CONFIG_DIR: &str = "config";
}

/// Environment variable prefix for overrides (`SALESAI__TRAINING__SEED=7`)
pub const ENV_PREFIX: &str = "SALESAI";
