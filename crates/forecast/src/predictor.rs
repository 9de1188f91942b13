//! Target-hit prediction service
//!
//! The model handle is loaded on first use and then shared read-only. A
//! retrained artifact on disk is only picked up after [`Predictor::invalidate`]
//! or a restart.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use salesai_config::FunnelConfig;
use salesai_core::{
    ActivityCounts, Agent, Clock, DateWindow, Error, FeatureVector, OrgDirectory, Outcome,
    Prediction, Result, RiskLevel, SalesRepository,
};
use salesai_funnel::{
    AiRecommendation, FunnelAnalysis, FunnelAnalyzer, FunnelHealth, FunnelMetrics,
    FunnelStageAnalysis, MetricsRecommendation, StageKey,
};

use crate::artifact::{ModelStore, PersistedModel};
use crate::features::FeatureBuilder;
use crate::forest::RandomForest;

/// Prediction plus funnel diagnostics for one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastInsights {
    #[serde(flatten)]
    pub prediction: Prediction,
    pub funnel_metrics: FunnelMetrics,
    pub funnel_health: FunnelHealth,
    pub funnel_recommendations: Vec<MetricsRecommendation>,
    pub weakest_stage: StageKey,
    pub funnel_analysis: FunnelAnalysis,
    pub ai_recommendations: Vec<AiRecommendation>,
    pub funnel_score: f64,
    pub primary_bottleneck: Option<FunnelStageAnalysis>,
}

pub struct Predictor {
    directory: Arc<dyn OrgDirectory>,
    features: FeatureBuilder,
    funnel: FunnelAnalyzer,
    store: ModelStore,
    clock: Arc<dyn Clock>,
    cached: RwLock<Option<Arc<PersistedModel>>>,
    load_lock: Mutex<()>,
}

impl Predictor {
    pub fn new<R: SalesRepository>(
        repo: Arc<R>,
        store: ModelStore,
        clock: Arc<dyn Clock>,
        funnel_config: FunnelConfig,
    ) -> Self {
        Self {
            directory: repo.clone(),
            features: FeatureBuilder::new(repo.clone()),
            funnel: FunnelAnalyzer::new(repo, funnel_config),
            store,
            clock,
            cached: RwLock::new(None),
            load_lock: Mutex::new(()),
        }
    }

    pub fn funnel(&self) -> &FunnelAnalyzer {
        &self.funnel
    }

    /// Cached model, reading the artifact on first call
    pub fn load_model(&self) -> Result<Arc<PersistedModel>> {
        if let Some(model) = self.cached.read().as_ref() {
            return Ok(Arc::clone(model));
        }

        let _guard = self.load_lock.lock();
        // Another caller may have loaded it while we waited
        if let Some(model) = self.cached.read().as_ref() {
            return Ok(Arc::clone(model));
        }

        let model = Arc::new(self.store.load()?);
        *self.cached.write() = Some(Arc::clone(&model));
        Ok(model)
    }

    /// Serve a freshly trained model without rereading the artifact
    pub fn install(&self, model: Arc<PersistedModel>) {
        let _guard = self.load_lock.lock();
        *self.cached.write() = Some(model);
    }

    /// Drop the cached handle; the next prediction rereads the artifact
    pub fn invalidate(&self) {
        let _guard = self.load_lock.lock();
        if self.cached.write().take().is_some() {
            tracing::info!(path = %self.store.path().display(), "Model cache invalidated");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cached.read().is_some()
    }

    /// Forecast the current calendar month for one agent
    pub async fn predict_agent(&self, agent_id: &str) -> Result<Prediction> {
        let model = self.load_model()?;
        let agent = self
            .directory
            .get_agent(agent_id)
            .await?
            .ok_or_else(|| Error::agent_not_found(agent_id))?;

        let window = self.clock.current_month();
        let features = self
            .features
            .build(&agent.id, agent.monthly_target, &window)
            .await?;

        let prediction = classify(&model.forest, &agent, features);
        tracing::debug!(
            agent_id = %prediction.agent_id,
            prediction = prediction.prediction.as_str(),
            probability_miss = prediction.probability_miss,
            risk = prediction.risk_level.as_str(),
            "Agent predicted"
        );
        Ok(prediction)
    }

    pub async fn get_prediction_with_funnel_insights(&self, agent_id: &str) -> Result<ForecastInsights> {
        let prediction = self.predict_agent(agent_id).await?;
        let metrics = self.funnel.get_funnel_metrics(agent_id).await?;
        let analysis = self.funnel.analyze_metrics(&metrics);
        let ai_recommendations = salesai_funnel::recommendations_for(&analysis);

        Ok(ForecastInsights {
            prediction,
            funnel_health: metrics.funnel_health,
            funnel_recommendations: metrics.recommendations.clone(),
            weakest_stage: metrics.weakest_stage,
            funnel_score: analysis.funnel_score,
            primary_bottleneck: analysis.primary_bottleneck.clone(),
            funnel_metrics: metrics,
            funnel_analysis: analysis,
            ai_recommendations,
        })
    }

    /// Every agent that can be predicted; individual failures are skipped
    ///
    /// A missing or invalid model is still an error, since no agent could be
    /// predicted.
    pub async fn predict_all_agents(&self) -> Result<Vec<Prediction>> {
        self.load_model()?;
        let agents = self.directory.list_agents().await?;

        let mut predictions = Vec::with_capacity(agents.len());
        for agent in &agents {
            match self.predict_agent(&agent.id).await {
                Ok(prediction) => predictions.push(prediction),
                Err(e) => {
                    tracing::warn!(agent_id = %agent.id, error = %e, "Prediction failed, skipping agent");
                }
            }
        }

        tracing::info!(
            agents = agents.len(),
            predicted = predictions.len(),
            "Batch prediction complete"
        );
        Ok(predictions)
    }
}

/// Apply the forest to one feature vector
///
/// A forest that only saw one class reports a single probability; it is
/// read as the probability of the predicted class.
pub fn classify(forest: &RandomForest, agent: &Agent, features: FeatureVector) -> Prediction {
    let row = features.to_row();
    let outcome = Outcome::from_label(forest.predict(&row));
    let probabilities = forest.predict_proba(&row);

    let (probability_miss, probability_hit) = match probabilities.as_slice() {
        [miss, hit] => (*miss, *hit),
        [p] => {
            let miss = if outcome == Outcome::Miss { *p } else { 1.0 - *p };
            (miss, 1.0 - miss)
        }
        _ => (0.0, 0.0),
    };
    let confidence = probabilities.iter().copied().fold(0.0, f64::max) * 100.0;

    Prediction {
        agent_id: agent.id.clone(),
        agent_name: agent.name.clone(),
        prediction: outcome,
        confidence,
        probability_hit: probability_hit * 100.0,
        probability_miss: probability_miss * 100.0,
        risk_level: RiskLevel::from_miss_probability(probability_miss),
        features,
    }
}

/// Forecast an agent from counts and sales the caller already fetched
///
/// No store round-trips; roll-ups load the model once and pass the same
/// handle for every agent.
pub fn predict_prefetched(
    model: &PersistedModel,
    agent: &Agent,
    counts: &ActivityCounts,
    total_sales: f64,
    window: &DateWindow,
) -> Prediction {
    let features = FeatureVector::from_counts(counts, total_sales, agent.monthly_target, window.days());
    classify(&model.forest, agent, features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::ForestParams;
    use salesai_core::FEATURE_COUNT;

    fn agent() -> Agent {
        Agent {
            id: "A1".into(),
            name: "Asha".into(),
            email: String::new(),
            monthly_target: 500_000.0,
            area_manager_id: None,
        }
    }

    fn forest(labels: &[u8]) -> RandomForest {
        let rows: Vec<Vec<f64>> = (0..labels.len())
            .map(|i| {
                let mut row = vec![0.0; FEATURE_COUNT];
                row[6] = i as f64;
                row
            })
            .collect();
        let params = ForestParams {
            n_trees: 5,
            max_depth: 5,
            min_samples_split: 2,
            seed: 42,
        };
        RandomForest::fit(&rows, labels, &params).unwrap()
    }

    #[test]
    fn test_single_miss_class() {
        let prediction = classify(&forest(&[0, 0, 0, 0]), &agent(), FeatureVector::default());

        assert_eq!(prediction.prediction, Outcome::Miss);
        assert_eq!(prediction.probability_miss, 100.0);
        assert_eq!(prediction.probability_hit, 0.0);
        assert_eq!(prediction.confidence, 100.0);
        assert_eq!(prediction.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_single_hit_class() {
        let prediction = classify(&forest(&[1, 1, 1, 1]), &agent(), FeatureVector::default());

        assert_eq!(prediction.prediction, Outcome::Hit);
        assert_eq!(prediction.probability_hit, 100.0);
        assert_eq!(prediction.probability_miss, 0.0);
        assert_eq!(prediction.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_two_class_probabilities_sum_to_hundred() {
        let labels: Vec<u8> = (0..40).map(|i| u8::from(i >= 20)).collect();
        let forest = forest(&labels);

        let fv = FeatureVector {
            sales_percentage: 35.0,
            ..Default::default()
        };
        let prediction = classify(&forest, &agent(), fv);
        assert_eq!(prediction.prediction, Outcome::Hit);
        assert!((prediction.probability_hit + prediction.probability_miss - 100.0).abs() < 1e-9);
        assert_eq!(prediction.confidence, prediction.probability_hit);
        assert_eq!(prediction.features, fv);
    }
}
