//! Target-hit forecasting
//!
//! - `features`: per-window feature vectors from the activity store
//! - `training` / `synthetic`: labelled sets, with a seeded synthetic fallback
//! - `forest`: CART random forest (Gini, bootstrap, rayon)
//! - `trainer` / `evaluation`: holdout split, metrics, train-then-persist
//! - `artifact`: the JSON model document and its schema check
//! - `predictor`: the cached-model prediction service

pub mod artifact;
pub mod evaluation;
pub mod features;
pub mod forest;
pub mod predictor;
pub mod synthetic;
pub mod trainer;
pub mod training;

pub use artifact::{ModelStore, PersistedModel, FORMAT_VERSION};
pub use evaluation::{
    accuracy, rank_importances, train_test_split, ClassMetrics, ClassificationReport,
    FeatureImportance,
};
pub use features::FeatureBuilder;
pub use forest::{ForestParams, RandomForest};
pub use predictor::{classify, predict_prefetched, ForecastInsights, Predictor};
pub use synthetic::{synthetic_label, SyntheticDataGenerator};
pub use trainer::{ClassifierTrainer, TrainedModel, TrainingPipeline};
pub use training::{DataSource, TrainingExample, TrainingSet, TrainingSetGenerator};
