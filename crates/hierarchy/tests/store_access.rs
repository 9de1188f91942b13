//! Store access patterns of the roll-ups, observed through a wrapping store

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use salesai_config::{FunnelConfig, PerformanceConfig, TrainingConfig};
use salesai_core::{
    Activity, ActivityCounts, ActivityStore, ActivityType, Agent, AreaManager, Clock, DateWindow,
    DivisionHead, Error, FixedClock, OrgDirectory, Product, Result, Sale,
};
use salesai_forecast::{ModelStore, Predictor, TrainingPipeline};
use salesai_hierarchy::{DetailOptions, DetailOutcome, HierarchyAggregator};
use salesai_persistence::{DemoOrganization, InMemoryStore};

/// Delegates to an `InMemoryStore`, counting single-agent lookups
struct InstrumentedStore {
    inner: Arc<InMemoryStore>,
    single_agent_calls: AtomicUsize,
    failing_history: Option<String>,
    repeat_first_listed: bool,
}

impl InstrumentedStore {
    fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            single_agent_calls: AtomicUsize::new(0),
            failing_history: None,
            repeat_first_listed: false,
        }
    }

    fn failing_history_for(mut self, agent_id: &str) -> Self {
        self.failing_history = Some(agent_id.to_string());
        self
    }

    fn repeating_first_listed(mut self) -> Self {
        self.repeat_first_listed = true;
        self
    }

    fn single_agent_calls(&self) -> usize {
        self.single_agent_calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.single_agent_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrgDirectory for InstrumentedStore {
    async fn get_agent(&self, agent_id: &str) -> Result<Option<Agent>> {
        self.touch();
        self.inner.get_agent(agent_id).await
    }

    async fn list_agents(&self) -> Result<Vec<Agent>> {
        self.inner.list_agents().await
    }

    async fn list_agents_by_area_manager(&self, manager_id: &str) -> Result<Vec<Agent>> {
        let mut agents = self.inner.list_agents_by_area_manager(manager_id).await?;
        if self.repeat_first_listed {
            if let Some(first) = agents.first().cloned() {
                agents.push(first);
            }
        }
        Ok(agents)
    }

    async fn list_agents_by_area_managers(&self, manager_ids: &[String]) -> Result<Vec<Agent>> {
        self.inner.list_agents_by_area_managers(manager_ids).await
    }

    async fn get_area_manager(&self, manager_id: &str) -> Result<Option<AreaManager>> {
        self.inner.get_area_manager(manager_id).await
    }

    async fn list_area_managers_by_division_head(&self, head_id: &str) -> Result<Vec<AreaManager>> {
        self.inner.list_area_managers_by_division_head(head_id).await
    }

    async fn get_division_head(&self, head_id: &str) -> Result<Option<DivisionHead>> {
        self.inner.get_division_head(head_id).await
    }
}

#[async_trait]
impl ActivityStore for InstrumentedStore {
    async fn count_activities(
        &self,
        agent_id: &str,
        activity_type: ActivityType,
        window: &DateWindow,
    ) -> Result<u64> {
        self.touch();
        self.inner.count_activities(agent_id, activity_type, window).await
    }

    async fn activity_counts(&self, agent_id: &str, window: &DateWindow) -> Result<ActivityCounts> {
        self.touch();
        self.inner.activity_counts(agent_id, window).await
    }

    async fn activity_counts_for_agents(
        &self,
        agent_ids: &[String],
        window: &DateWindow,
    ) -> Result<HashMap<String, ActivityCounts>> {
        self.inner.activity_counts_for_agents(agent_ids, window).await
    }

    async fn list_activities(&self, agent_id: &str) -> Result<Vec<Activity>> {
        if self.failing_history.as_deref() == Some(agent_id) {
            return Err(Error::Persistence(format!("activity history unavailable for {}", agent_id)));
        }
        self.inner.list_activities(agent_id).await
    }

    async fn sum_sales(&self, agent_id: &str, window: &DateWindow) -> Result<f64> {
        self.touch();
        self.inner.sum_sales(agent_id, window).await
    }

    async fn sum_sales_for_agents(
        &self,
        agent_ids: &[String],
        window: &DateWindow,
    ) -> Result<HashMap<String, f64>> {
        self.inner.sum_sales_for_agents(agent_ids, window).await
    }

    async fn list_sales(&self, agent_id: &str) -> Result<Vec<Sale>> {
        self.inner.list_sales(agent_id).await
    }

    async fn get_product(&self, product_id: &str) -> Result<Option<Product>> {
        self.inner.get_product(product_id).await
    }
}

fn clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()))
}

fn demo_store() -> Arc<InMemoryStore> {
    let today = clock().today();
    Arc::new(InMemoryStore::from_dataset(DemoOrganization::default().generate(today)).unwrap())
}

fn aggregator(store: &Arc<InstrumentedStore>, model_dir: &Path) -> HierarchyAggregator {
    let predictor = Predictor::new(
        store.clone(),
        ModelStore::new(model_dir.join("model.json")),
        clock(),
        FunnelConfig::default(),
    );
    HierarchyAggregator::new(store.clone(), Arc::new(predictor), clock(), PerformanceConfig::default())
}

#[tokio::test]
async fn test_division_rollup_uses_batch_queries_only() {
    let dir = tempfile::tempdir().unwrap();
    let inner = demo_store();
    let config = TrainingConfig {
        trees: 15,
        ..TrainingConfig::default()
    };
    TrainingPipeline::new(inner.clone(), clock(), ModelStore::new(dir.path().join("model.json")), config)
        .train()
        .await
        .unwrap();

    let store = Arc::new(InstrumentedStore::new(inner));
    let division = aggregator(&store, dir.path())
        .get_division_head_performance("DH01")
        .await
        .unwrap();

    assert_eq!(division.summary.total_agents, 4);
    let s = &division.summary;
    assert_eq!(s.high_risk_count + s.medium_risk_count + s.low_risk_count, 4);
    assert_eq!(store.single_agent_calls(), 0);
}

#[tokio::test]
async fn test_detail_failure_stays_with_its_agent() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(InstrumentedStore::new(demo_store()).failing_history_for("A101"));
    let aggregator = aggregator(&store, dir.path()).with_detail(DetailOptions::full());

    let area = aggregator.get_area_manager_performance("AM01").await.unwrap();
    assert_eq!(area.agents.len(), 2);
    assert_eq!(area.summary.total_agents, 2);

    for rollup in &area.agents {
        let detail = rollup.detail.as_ref().unwrap();
        if rollup.agent_id == "A101" {
            match detail {
                DetailOutcome::Unavailable { reason } => {
                    assert!(reason.contains("activity history unavailable"))
                }
                other => panic!("expected unavailable detail, got {:?}", other),
            }
        } else {
            assert!(detail.detail().is_some());
        }
    }

    let json = serde_json::to_value(&area).unwrap();
    assert!(json["agents"]
        .as_array()
        .unwrap()
        .iter()
        .any(|a| a["detail"]["status"] == "unavailable"));
}

#[tokio::test]
async fn test_agent_listed_twice_appears_twice() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(InstrumentedStore::new(demo_store()).repeating_first_listed());
    let aggregator = aggregator(&store, dir.path());

    let area = aggregator.get_area_manager_performance("AM01").await.unwrap();
    assert_eq!(area.agents.len(), 3);
    assert_eq!(area.summary.total_agents, 3);

    let first = &area.agents[0];
    let repeated = area.agents.iter().filter(|a| a.agent_id == first.agent_id).count();
    assert_eq!(repeated, 2);
}
