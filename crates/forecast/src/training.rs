//! Labelled training sets from agent history

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use salesai_config::TrainingConfig;
use salesai_core::{Clock, DateWindow, FeatureVector, OrgDirectory, Result, SalesRepository};

use crate::features::FeatureBuilder;
use crate::synthetic::SyntheticDataGenerator;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    pub features: FeatureVector,
    /// 1 = target hit, 0 = missed
    pub label: u8,
}

impl TrainingExample {
    /// Label from real history: HIT iff sales reach the full target
    pub fn from_history(features: FeatureVector) -> Self {
        let label = u8::from(features.total_sales >= features.monthly_target);
        Self { features, label }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Real,
    Synthetic,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Real => "real",
            Self::Synthetic => "synthetic",
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    pub examples: Vec<TrainingExample>,
    pub source: DataSource,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.examples
            .iter()
            .map(|e| e.features.to_row().to_vec())
            .collect()
    }

    pub fn labels(&self) -> Vec<u8> {
        self.examples.iter().map(|e| e.label).collect()
    }

    /// (miss, hit) example counts
    pub fn label_distribution(&self) -> (usize, usize) {
        let hits = self.examples.iter().filter(|e| e.label == 1).count();
        (self.examples.len() - hits, hits)
    }
}

/// Sweeps every agent over the trailing months
pub struct TrainingSetGenerator {
    directory: Arc<dyn OrgDirectory>,
    features: FeatureBuilder,
    clock: Arc<dyn Clock>,
    config: TrainingConfig,
}

impl TrainingSetGenerator {
    pub fn new<R: SalesRepository>(repo: Arc<R>, clock: Arc<dyn Clock>, config: TrainingConfig) -> Self {
        Self {
            directory: repo.clone(),
            features: FeatureBuilder::new(repo),
            clock,
            config,
        }
    }

    /// One example per agent per month, the current partial month included
    pub async fn real_examples(&self) -> Result<Vec<TrainingExample>> {
        let windows = DateWindow::trailing_months(self.clock.today(), self.config.trailing_months);
        let agents = self.directory.list_agents().await?;

        let mut examples = Vec::with_capacity(agents.len() * windows.len());
        for agent in &agents {
            for window in &windows {
                let features = self
                    .features
                    .build(&agent.id, agent.monthly_target, window)
                    .await?;
                examples.push(TrainingExample::from_history(features));
            }
        }
        Ok(examples)
    }

    /// Real history, or the synthetic set when history is too thin
    pub async fn generate(&self) -> Result<TrainingSet> {
        let examples = self.real_examples().await?;

        let set = if examples.len() < self.config.min_real_examples {
            tracing::info!(
                real_examples = examples.len(),
                required = self.config.min_real_examples,
                "Insufficient history, using synthetic training data"
            );
            TrainingSet {
                examples: SyntheticDataGenerator::from_config(&self.config).generate(),
                source: DataSource::Synthetic,
            }
        } else {
            TrainingSet {
                examples,
                source: DataSource::Real,
            }
        };

        let (miss, hit) = set.label_distribution();
        tracing::info!(
            source = %set.source,
            examples = set.len(),
            features = salesai_core::FEATURE_COUNT,
            miss,
            hit,
            "Training set ready"
        );
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use salesai_core::{Agent, FixedClock, Sale};
    use salesai_persistence::{DemoOrganization, InMemoryStore};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
    }

    fn generator(store: InMemoryStore) -> TrainingSetGenerator {
        TrainingSetGenerator::new(
            Arc::new(store),
            Arc::new(FixedClock(today())),
            TrainingConfig::default(),
        )
    }

    fn agent(id: &str, target: f64) -> Agent {
        Agent {
            id: id.into(),
            name: id.into(),
            email: String::new(),
            monthly_target: target,
            area_manager_id: None,
        }
    }

    #[test]
    fn test_target_boundary_is_hit() {
        let fv = FeatureVector {
            total_sales: 600_000.0,
            monthly_target: 600_000.0,
            ..Default::default()
        };
        assert_eq!(TrainingExample::from_history(fv).label, 1);

        let fv = FeatureVector {
            total_sales: 599_999.99,
            monthly_target: 600_000.0,
            ..Default::default()
        };
        assert_eq!(TrainingExample::from_history(fv).label, 0);
    }

    #[tokio::test]
    async fn test_thin_history_falls_back_to_synthetic() {
        // One agent x 6 months = 6 examples, below the minimum of 10
        let store = InMemoryStore::new();
        store.insert_agent(agent("A1", 500_000.0)).unwrap();

        let set = generator(store).generate().await.unwrap();
        assert_eq!(set.source, DataSource::Synthetic);
        assert_eq!(set.examples, SyntheticDataGenerator::default().generate());
    }

    #[tokio::test]
    async fn test_real_history_is_used_when_sufficient() {
        let store = InMemoryStore::from_dataset(DemoOrganization::default().generate(today())).unwrap();
        let set = generator(store).generate().await.unwrap();

        // 6 agents x 6 months
        assert_eq!(set.source, DataSource::Real);
        assert_eq!(set.len(), 36);
        assert_eq!(set.rows()[0].len(), salesai_core::FEATURE_COUNT);
    }

    #[tokio::test]
    async fn test_each_month_is_labelled_separately() {
        let store = InMemoryStore::new();
        store.insert_agent(agent("A1", 600_000.0)).unwrap();
        store.insert_agent(agent("A2", 600_000.0)).unwrap();
        store
            .record_sale(Sale {
                id: "S1".into(),
                agent_id: "A1".into(),
                amount: 600_000.0,
                customer: "Acme".into(),
                product_id: None,
                occurred_at: Utc.with_ymd_and_hms(2026, 8, 10, 9, 0, 0).unwrap(),
                notes: String::new(),
            })
            .unwrap();

        let examples = generator(store).real_examples().await.unwrap();
        assert_eq!(examples.len(), 12);
        let hits: Vec<&TrainingExample> = examples.iter().filter(|e| e.label == 1).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].features.total_sales, 600_000.0);
    }
}
