//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{benchmarks, paths, performance, recommendation_thresholds, training};
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    #[default]
    Development,
    Staging,
    Production,
}

impl RuntimeEnvironment {
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Main application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Model artifact location
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub training: TrainingConfig,

    /// Benchmarks and recommendation floors
    #[serde(default)]
    pub funnel: FunnelConfig,

    /// Base score weights and activity targets
    #[serde(default)]
    pub performance: PerformanceConfig,

    #[serde(default)]
    pub persistence: PersistenceConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Path of the persisted forecast model (JSON)
    #[serde(default = "default_artifact_path")]
    pub artifact_path: String,
}

fn default_artifact_path() -> String {
    paths::MODEL_ARTIFACT.to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            artifact_path: default_artifact_path(),
        }
    }
}

/// Classifier training parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Holdout share, in (0, 1)
    pub test_fraction: f64,
    /// Seed for the split and the forest
    pub seed: u64,
    pub trees: usize,
    pub max_depth: usize,
    /// Calendar months swept per agent, the current one included
    pub trailing_months: u32,
    pub min_real_examples: usize,
    pub synthetic_samples: usize,
    pub synthetic_seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_fraction: training::TEST_FRACTION,
            seed: training::SEED,
            trees: training::TREES,
            max_depth: training::MAX_DEPTH,
            trailing_months: training::TRAILING_MONTHS,
            min_real_examples: training::MIN_REAL_EXAMPLES,
            synthetic_samples: training::SYNTHETIC_SAMPLES,
            synthetic_seed: training::SYNTHETIC_SEED,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FunnelConfig {
    #[serde(default)]
    pub benchmarks: FunnelBenchmarks,
    #[serde(default)]
    pub recommendation_thresholds: RecommendationThresholds,
}

/// Industry conversion benchmarks, percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunnelBenchmarks {
    pub calls_to_leads: f64,
    pub leads_to_meetings: f64,
    pub meetings_to_deals: f64,
    pub deals_to_sales: f64,
    pub overall: f64,
}

impl Default for FunnelBenchmarks {
    fn default() -> Self {
        Self {
            calls_to_leads: benchmarks::CALLS_TO_LEADS,
            leads_to_meetings: benchmarks::LEADS_TO_MEETINGS,
            meetings_to_deals: benchmarks::MEETINGS_TO_DEALS,
            deals_to_sales: benchmarks::DEALS_TO_SALES,
            overall: benchmarks::OVERALL,
        }
    }
}

/// Conversion floors (percent) that trigger a metrics recommendation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationThresholds {
    pub calls_to_leads: f64,
    pub leads_to_meetings: f64,
    pub meetings_to_deals: f64,
    pub deals_to_sales: f64,
}

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            calls_to_leads: recommendation_thresholds::CALLS_TO_LEADS,
            leads_to_meetings: recommendation_thresholds::LEADS_TO_MEETINGS,
            meetings_to_deals: recommendation_thresholds::MEETINGS_TO_DEALS,
            deals_to_sales: recommendation_thresholds::DEALS_TO_SALES,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceConfig {
    #[serde(default)]
    pub weights: ScoreWeights,
    #[serde(default)]
    pub targets: ActivityTargets,
}

/// Sub-score weights; must sum to 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub calls: f64,
    pub meetings: f64,
    pub leads: f64,
    pub deals: f64,
    pub sales: f64,
}

impl ScoreWeights {
    pub fn total(&self) -> f64 {
        self.calls + self.meetings + self.leads + self.deals + self.sales
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            calls: performance::WEIGHT_CALLS,
            meetings: performance::WEIGHT_MEETINGS,
            leads: performance::WEIGHT_LEADS,
            deals: performance::WEIGHT_DEALS,
            sales: performance::WEIGHT_SALES,
        }
    }
}

/// Monthly activity targets per agent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityTargets {
    pub calls: u64,
    pub meetings: u64,
    pub leads: u64,
    pub deals: u64,
}

impl Default for ActivityTargets {
    fn default() -> Self {
        Self {
            calls: performance::TARGET_CALLS,
            meetings: performance::TARGET_MEETINGS,
            leads: performance::TARGET_LEADS,
            deals: performance::TARGET_DEALS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// JSON dataset snapshot loaded into the in-memory store
    #[serde(default = "default_dataset_path")]
    pub dataset_path: String,
}

fn default_dataset_path() -> String {
    paths::DATASET.to_string()
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            dataset_path: default_dataset_path(),
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_observability()?;
        self.validate_training()?;
        self.validate_funnel()?;
        self.validate_performance()?;
        Ok(())
    }

    fn validate_observability(&self) -> Result<(), ConfigError> {
        if self.observability.log_level.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "observability.log_level".to_string(),
                message: "Must not be empty".to_string(),
            });
        }
        Ok(())
    }

    fn validate_training(&self) -> Result<(), ConfigError> {
        let training = &self.training;

        if !(training.test_fraction > 0.0 && training.test_fraction < 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "training.test_fraction".to_string(),
                message: format!(
                    "Must be strictly between 0.0 and 1.0, got {}",
                    training.test_fraction
                ),
            });
        }

        if training.trees == 0 {
            return Err(ConfigError::InvalidValue {
                field: "training.trees".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if training.max_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "training.max_depth".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if training.trailing_months == 0 {
            return Err(ConfigError::InvalidValue {
                field: "training.trailing_months".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if training.synthetic_samples < 2 {
            return Err(ConfigError::InvalidValue {
                field: "training.synthetic_samples".to_string(),
                message: format!("Need at least 2 samples to split, got {}", training.synthetic_samples),
            });
        }

        Ok(())
    }

    fn validate_funnel(&self) -> Result<(), ConfigError> {
        let b = &self.funnel.benchmarks;
        let named = [
            ("funnel.benchmarks.calls_to_leads", b.calls_to_leads),
            ("funnel.benchmarks.leads_to_meetings", b.leads_to_meetings),
            ("funnel.benchmarks.meetings_to_deals", b.meetings_to_deals),
            ("funnel.benchmarks.deals_to_sales", b.deals_to_sales),
            ("funnel.benchmarks.overall", b.overall),
        ];
        for (field, value) in named {
            if !(value > 0.0 && value <= 100.0) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("Must be in (0, 100], got {}", value),
                });
            }
        }

        let t = &self.funnel.recommendation_thresholds;
        let named = [
            ("funnel.recommendation_thresholds.calls_to_leads", t.calls_to_leads),
            ("funnel.recommendation_thresholds.leads_to_meetings", t.leads_to_meetings),
            ("funnel.recommendation_thresholds.meetings_to_deals", t.meetings_to_deals),
            ("funnel.recommendation_thresholds.deals_to_sales", t.deals_to_sales),
        ];
        for (field, value) in named {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("Must be between 0 and 100, got {}", value),
                });
            }
        }

        Ok(())
    }

    fn validate_performance(&self) -> Result<(), ConfigError> {
        let weights = &self.performance.weights;
        let all = [
            weights.calls,
            weights.meetings,
            weights.leads,
            weights.deals,
            weights.sales,
        ];
        if all.iter().any(|w| *w < 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "performance.weights".to_string(),
                message: "Weights must be non-negative".to_string(),
            });
        }

        let total = weights.total();
        if (total - 1.0).abs() > 1e-6 {
            return Err(ConfigError::InvalidValue {
                field: "performance.weights".to_string(),
                message: format!("Weights must sum to 1.0, got {}", total),
            });
        }

        Ok(())
    }
}

/// Load settings from files and environment
///
/// Sources, later ones win:
/// 1. `config/default.{toml,yaml,json}`
/// 2. `config/{env}.{toml,yaml,json}`
/// 3. `SALESAI__SECTION__KEY` environment variables
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(
        File::with_name(&format!("{}/default", paths::CONFIG_DIR)).required(false),
    );

    if let Some(env_name) = env {
        builder = builder.add_source(
            File::with_name(&format!("{}/{}", paths::CONFIG_DIR, env_name)).required(false),
        );
    }

    builder = builder.add_source(
        Environment::with_prefix(crate::constants::ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    tracing::debug!(
        environment = ?settings.environment,
        artifact = %settings.model.artifact_path,
        "Settings loaded"
    );

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.environment, RuntimeEnvironment::Development);
        assert_eq!(settings.model.artifact_path, "models/forecast_model.json");
        assert_eq!(settings.training.test_fraction, 0.2);
        assert_eq!(settings.training.seed, 42);
        assert_eq!(settings.training.trees, 100);
        assert_eq!(settings.training.max_depth, 10);
        assert_eq!(settings.training.trailing_months, 6);
        assert_eq!(settings.training.min_real_examples, 10);
        assert_eq!(settings.funnel.benchmarks.calls_to_leads, 25.0);
        assert_eq!(settings.funnel.benchmarks.overall, 8.0);
        assert_eq!(settings.performance.targets.meetings, 40);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_training_validation() {
        let mut settings = Settings::default();

        settings.training.test_fraction = 0.0;
        assert!(settings.validate_training().is_err());

        settings.training.test_fraction = 1.0;
        assert!(settings.validate_training().is_err());

        settings.training.test_fraction = 0.25;
        assert!(settings.validate_training().is_ok());

        settings.training.trees = 0;
        assert!(settings.validate_training().is_err());
        settings.training.trees = 10;

        settings.training.max_depth = 0;
        assert!(settings.validate_training().is_err());
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut settings = Settings::default();
        assert!(settings.validate_performance().is_ok());

        settings.performance.weights.sales = 0.5;
        let err = settings.validate_performance().unwrap_err();
        assert!(err.to_string().contains("performance.weights"));

        settings.performance.weights = ScoreWeights {
            calls: 1.2,
            meetings: -0.2,
            leads: 0.0,
            deals: 0.0,
            sales: 0.0,
        };
        assert!(settings.validate_performance().is_err());
    }

    #[test]
    fn test_benchmark_validation() {
        let mut settings = Settings::default();

        settings.funnel.benchmarks.overall = 0.0;
        assert!(settings.validate_funnel().is_err());

        settings.funnel.benchmarks.overall = 8.0;
        settings.funnel.recommendation_thresholds.deals_to_sales = 140.0;
        assert!(settings.validate_funnel().is_err());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            environment = "production"

            [training]
            seed = 7

            [funnel.benchmarks]
            calls_to_leads = 30.0
            "#,
        )
        .unwrap();

        assert!(settings.environment.is_production());
        assert_eq!(settings.training.seed, 7);
        assert_eq!(settings.training.trees, 100);
        assert_eq!(settings.funnel.benchmarks.calls_to_leads, 30.0);
        assert_eq!(settings.funnel.benchmarks.leads_to_meetings, 50.0);
        assert_eq!(settings.observability.log_level, "info");
    }

    #[test]
    fn test_load_settings_without_files() {
        // No config/ directory exists under the test working directory
        let settings = load_settings(Some("nonexistent")).unwrap();
        assert_eq!(settings.training.trees, 100);
    }
}
