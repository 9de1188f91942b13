//! Classifier training and the train-then-persist pipeline

use std::sync::Arc;
use std::time::Instant;

use salesai_config::TrainingConfig;
use salesai_core::{Clock, Error, Result, SalesRepository, FEATURE_COLUMNS};

use crate::artifact::{ModelStore, PersistedModel};
use crate::evaluation::{rank_importances, train_test_split, ClassificationReport, FeatureImportance};
use crate::forest::{ForestParams, RandomForest};
use crate::training::{TrainingSet, TrainingSetGenerator};

/// Result of one training run
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub model: Arc<PersistedModel>,
    /// Holdout accuracy in [0, 1]
    pub accuracy: f64,
    pub report: ClassificationReport,
    /// Most important first
    pub importances: Vec<FeatureImportance>,
}

/// Holdout split, forest fit and evaluation
#[derive(Debug, Clone, Copy)]
pub struct ClassifierTrainer {
    params: ForestParams,
    test_fraction: f64,
}

impl ClassifierTrainer {
    pub fn new(params: ForestParams, test_fraction: f64) -> Self {
        Self {
            params,
            test_fraction,
        }
    }

    pub fn from_config(config: &TrainingConfig) -> Self {
        Self::new(ForestParams::from_config(config), config.test_fraction)
    }

    /// CPU-bound; run on a blocking thread from async code
    pub fn fit(&self, set: &TrainingSet) -> Result<TrainedModel> {
        let started = Instant::now();
        let rows = set.rows();
        let labels = set.labels();
        let (train_idx, test_idx) = train_test_split(rows.len(), self.test_fraction, self.params.seed)?;

        let train_rows: Vec<Vec<f64>> = train_idx.iter().map(|&i| rows[i].clone()).collect();
        let train_labels: Vec<u8> = train_idx.iter().map(|&i| labels[i]).collect();

        tracing::info!(
            train = train_rows.len(),
            test = test_idx.len(),
            trees = self.params.n_trees,
            max_depth = self.params.max_depth,
            seed = self.params.seed,
            "Fitting random forest"
        );
        let forest = RandomForest::fit(&train_rows, &train_labels, &self.params)?;

        let truth: Vec<u8> = test_idx.iter().map(|&i| labels[i]).collect();
        let predicted: Vec<u8> = test_idx.iter().map(|&i| forest.predict(&rows[i])).collect();
        let report = ClassificationReport::from_predictions(&truth, &predicted);
        let accuracy = report.accuracy;
        let importances = rank_importances(&FEATURE_COLUMNS[..], forest.feature_importances());

        tracing::info!(
            accuracy,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Model trained"
        );
        tracing::info!("Classification report:\n{}", report);
        for entry in importances.iter().take(5) {
            tracing::info!(feature = %entry.feature, importance = entry.importance, "Feature importance");
        }

        let model = PersistedModel::new(forest, accuracy, set.source, set.len());
        Ok(TrainedModel {
            model: Arc::new(model),
            accuracy,
            report,
            importances,
        })
    }
}

/// Generate a training set, fit, and persist the artifact
pub struct TrainingPipeline {
    generator: TrainingSetGenerator,
    store: ModelStore,
    config: TrainingConfig,
}

impl TrainingPipeline {
    pub fn new<R: SalesRepository>(
        repo: Arc<R>,
        clock: Arc<dyn Clock>,
        store: ModelStore,
        config: TrainingConfig,
    ) -> Self {
        Self {
            generator: TrainingSetGenerator::new(repo, clock, config.clone()),
            store,
            config,
        }
    }

    pub fn store(&self) -> &ModelStore {
        &self.store
    }

    /// Train with the configured test fraction and seed
    pub async fn train(&self) -> Result<TrainedModel> {
        self.train_model(self.config.test_fraction, self.config.seed).await
    }

    pub async fn train_model(&self, test_fraction: f64, seed: u64) -> Result<TrainedModel> {
        let set = self.generator.generate().await?;

        let params = ForestParams {
            seed,
            ..ForestParams::from_config(&self.config)
        };
        let trainer = ClassifierTrainer::new(params, test_fraction);
        let trained = tokio::task::spawn_blocking(move || trainer.fit(&set))
            .await
            .map_err(|e| Error::Training(format!("training task failed: {}", e)))??;

        self.store.save(&trained.model)?;
        tracing::info!(
            path = %self.store.path().display(),
            model_id = %trained.model.model_id,
            accuracy = trained.accuracy,
            "Model persisted"
        );
        Ok(trained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::SyntheticDataGenerator;
    use crate::training::DataSource;

    fn synthetic_set() -> TrainingSet {
        TrainingSet {
            examples: SyntheticDataGenerator::default().generate(),
            source: DataSource::Synthetic,
        }
    }

    fn small_trainer() -> ClassifierTrainer {
        ClassifierTrainer::new(
            ForestParams {
                n_trees: 20,
                ..ForestParams::default()
            },
            0.2,
        )
    }

    #[test]
    fn test_fit_reports_holdout_metrics() {
        let trained = small_trainer().fit(&synthetic_set()).unwrap();

        assert!((0.0..=1.0).contains(&trained.accuracy));
        assert_eq!(trained.report.macro_avg.support, 20);
        assert_eq!(trained.importances.len(), FEATURE_COLUMNS.len());
        assert!(trained
            .importances
            .windows(2)
            .all(|w| w[0].importance >= w[1].importance));
        assert_eq!(trained.model.training_source, DataSource::Synthetic);
        assert_eq!(trained.model.training_examples, 100);
        assert!(trained.model.validate().is_ok());
    }

    #[test]
    fn test_fit_is_reproducible() {
        let a = small_trainer().fit(&synthetic_set()).unwrap();
        let b = small_trainer().fit(&synthetic_set()).unwrap();
        assert_eq!(a.model.forest, b.model.forest);
        assert_eq!(a.accuracy, b.accuracy);
    }

    #[test]
    fn test_unsplittable_set_is_training_error() {
        let mut set = synthetic_set();
        set.examples.truncate(1);
        assert!(matches!(small_trainer().fit(&set), Err(Error::Training(_))));
    }
}
