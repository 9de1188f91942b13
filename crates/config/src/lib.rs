//! Configuration management for sales forecasting
//!
//! Supports loading configuration from:
//! - TOML/YAML/JSON files under `config/`
//! - Environment variables (`SALESAI__` prefix, `__` between sections)
//!
//! Every section has working defaults, so an empty environment yields a
//! usable `Settings`.

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, ActivityTargets, FunnelBenchmarks, FunnelConfig, ModelConfig,
    ObservabilityConfig, PerformanceConfig, PersistenceConfig, RecommendationThresholds,
    RuntimeEnvironment, ScoreWeights, Settings, TrainingConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(key) => ConfigError::MissingField(key),
            other => ConfigError::ParseError(other.to_string()),
        }
    }
}
