//! In-memory implementation of the collaborator traits
//!
//! All tables sit behind one `parking_lot::RwLock`, so a batch query sees
//! a consistent snapshot and costs a single lock acquisition.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

use salesai_core::{
    Activity, ActivityCounts, ActivityStore, ActivityType, Agent, AreaManager, DateWindow,
    DivisionHead, OrgDirectory, Product, Result, Sale,
};

use crate::{Dataset, PersistenceError};

#[derive(Default)]
struct Tables {
    division_heads: BTreeMap<String, DivisionHead>,
    area_managers: BTreeMap<String, AreaManager>,
    agents: BTreeMap<String, Agent>,
    products: HashMap<String, Product>,
    /// Keyed by agent id, kept in insertion order
    activities: HashMap<String, Vec<Activity>>,
    sales: HashMap<String, Vec<Sale>>,
    activity_count: usize,
    sale_count: usize,
}

impl Tables {
    fn counts(&self, agent_id: &str, window: &DateWindow) -> ActivityCounts {
        let mut counts = ActivityCounts::default();
        for activity in self.activities.get(agent_id).into_iter().flatten() {
            if window.contains(&activity.occurred_at) {
                counts.record(activity.activity_type);
            }
        }
        counts
    }

    fn sales_total(&self, agent_id: &str, window: &DateWindow) -> f64 {
        self.sales
            .get(agent_id)
            .into_iter()
            .flatten()
            .filter(|s| window.contains(&s.occurred_at))
            .map(|s| s.amount)
            .sum()
    }
}

/// Dataset snapshot held in memory
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a validated snapshot
    pub fn from_dataset(dataset: Dataset) -> std::result::Result<Self, PersistenceError> {
        dataset.validate()?;

        let store = Self::new();
        {
            let mut tables = store.tables.write();
            for head in dataset.division_heads {
                tables.division_heads.insert(head.id.clone(), head);
            }
            for manager in dataset.area_managers {
                tables.area_managers.insert(manager.id.clone(), manager);
            }
            for agent in dataset.agents {
                tables.agents.insert(agent.id.clone(), agent);
            }
            for product in dataset.products {
                tables.products.insert(product.id.clone(), product);
            }
            tables.activity_count = dataset.activities.len();
            for activity in dataset.activities {
                tables
                    .activities
                    .entry(activity.agent_id.clone())
                    .or_default()
                    .push(activity);
            }
            tables.sale_count = dataset.sales.len();
            for sale in dataset.sales {
                tables.sales.entry(sale.agent_id.clone()).or_default().push(sale);
            }

            tracing::debug!(
                agents = tables.agents.len(),
                activities = tables.activity_count,
                sales = tables.sale_count,
                "In-memory store populated"
            );
        }
        Ok(store)
    }

    /// Copy the current contents back out as a snapshot
    pub fn to_dataset(&self) -> Dataset {
        let tables = self.tables.read();
        let mut activities: Vec<Activity> = tables.activities.values().flatten().cloned().collect();
        activities.sort_by(|a, b| a.id.cmp(&b.id));
        let mut sales: Vec<Sale> = tables.sales.values().flatten().cloned().collect();
        sales.sort_by(|a, b| a.id.cmp(&b.id));
        let mut products: Vec<Product> = tables.products.values().cloned().collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));

        Dataset {
            division_heads: tables.division_heads.values().cloned().collect(),
            area_managers: tables.area_managers.values().cloned().collect(),
            agents: tables.agents.values().cloned().collect(),
            products,
            activities,
            sales,
        }
    }

    pub fn insert_division_head(&self, head: DivisionHead) -> std::result::Result<(), PersistenceError> {
        let mut tables = self.tables.write();
        if tables.division_heads.contains_key(&head.id) {
            return Err(PersistenceError::Duplicate {
                entity: "division head",
                id: head.id,
            });
        }
        tables.division_heads.insert(head.id.clone(), head);
        Ok(())
    }

    pub fn insert_area_manager(
        &self,
        manager: AreaManager,
    ) -> std::result::Result<(), PersistenceError> {
        let mut tables = self.tables.write();
        if tables.area_managers.contains_key(&manager.id) {
            return Err(PersistenceError::Duplicate {
                entity: "area manager",
                id: manager.id,
            });
        }
        if !tables.division_heads.contains_key(&manager.division_head_id) {
            return Err(PersistenceError::DanglingReference {
                entity: "area manager",
                id: manager.id,
                target: "division head",
                target_id: manager.division_head_id,
            });
        }
        tables.area_managers.insert(manager.id.clone(), manager);
        Ok(())
    }

    pub fn insert_agent(&self, agent: Agent) -> std::result::Result<(), PersistenceError> {
        let mut tables = self.tables.write();
        if tables.agents.contains_key(&agent.id) {
            return Err(PersistenceError::Duplicate {
                entity: "agent",
                id: agent.id,
            });
        }
        if let Some(manager_id) = &agent.area_manager_id {
            if !tables.area_managers.contains_key(manager_id) {
                return Err(PersistenceError::DanglingReference {
                    entity: "agent",
                    id: agent.id.clone(),
                    target: "area manager",
                    target_id: manager_id.clone(),
                });
            }
        }
        tables.agents.insert(agent.id.clone(), agent);
        Ok(())
    }

    pub fn insert_product(&self, product: Product) -> std::result::Result<(), PersistenceError> {
        let mut tables = self.tables.write();
        if tables.products.contains_key(&product.id) {
            return Err(PersistenceError::Duplicate {
                entity: "product",
                id: product.id,
            });
        }
        tables.products.insert(product.id.clone(), product);
        Ok(())
    }

    /// Log an activity for a known agent
    pub fn record_activity(&self, activity: Activity) -> std::result::Result<(), PersistenceError> {
        let mut tables = self.tables.write();
        if !tables.agents.contains_key(&activity.agent_id) {
            return Err(PersistenceError::DanglingReference {
                entity: "activity",
                id: activity.id,
                target: "agent",
                target_id: activity.agent_id,
            });
        }
        tracing::trace!(
            agent_id = %activity.agent_id,
            activity_type = %activity.activity_type,
            "Activity recorded"
        );
        tables.activity_count += 1;
        tables
            .activities
            .entry(activity.agent_id.clone())
            .or_default()
            .push(activity);
        Ok(())
    }

    /// Record a closed sale for a known agent
    pub fn record_sale(&self, sale: Sale) -> std::result::Result<(), PersistenceError> {
        if !(sale.amount.is_finite() && sale.amount >= 0.0) {
            return Err(PersistenceError::InvalidRecord(format!(
                "sale {} has amount {}",
                sale.id, sale.amount
            )));
        }
        let mut tables = self.tables.write();
        if !tables.agents.contains_key(&sale.agent_id) {
            return Err(PersistenceError::DanglingReference {
                entity: "sale",
                id: sale.id,
                target: "agent",
                target_id: sale.agent_id,
            });
        }
        tables.sale_count += 1;
        tables.sales.entry(sale.agent_id.clone()).or_default().push(sale);
        Ok(())
    }

    pub fn agent_count(&self) -> usize {
        self.tables.read().agents.len()
    }
}

#[async_trait]
impl OrgDirectory for InMemoryStore {
    async fn get_agent(&self, agent_id: &str) -> Result<Option<Agent>> {
        Ok(self.tables.read().agents.get(agent_id).cloned())
    }

    async fn list_agents(&self) -> Result<Vec<Agent>> {
        Ok(self.tables.read().agents.values().cloned().collect())
    }

    async fn list_agents_by_area_manager(&self, manager_id: &str) -> Result<Vec<Agent>> {
        Ok(self
            .tables
            .read()
            .agents
            .values()
            .filter(|a| a.area_manager_id.as_deref() == Some(manager_id))
            .cloned()
            .collect())
    }

    async fn list_agents_by_area_managers(&self, manager_ids: &[String]) -> Result<Vec<Agent>> {
        Ok(self
            .tables
            .read()
            .agents
            .values()
            .filter(|a| {
                a.area_manager_id
                    .as_ref()
                    .is_some_and(|m| manager_ids.contains(m))
            })
            .cloned()
            .collect())
    }

    async fn get_area_manager(&self, manager_id: &str) -> Result<Option<AreaManager>> {
        Ok(self.tables.read().area_managers.get(manager_id).cloned())
    }

    async fn list_area_managers_by_division_head(&self, head_id: &str) -> Result<Vec<AreaManager>> {
        Ok(self
            .tables
            .read()
            .area_managers
            .values()
            .filter(|m| m.division_head_id == head_id)
            .cloned()
            .collect())
    }

    async fn get_division_head(&self, head_id: &str) -> Result<Option<DivisionHead>> {
        Ok(self.tables.read().division_heads.get(head_id).cloned())
    }
}

#[async_trait]
impl ActivityStore for InMemoryStore {
    async fn count_activities(
        &self,
        agent_id: &str,
        activity_type: ActivityType,
        window: &DateWindow,
    ) -> Result<u64> {
        Ok(self.tables.read().counts(agent_id, window).get(activity_type))
    }

    async fn activity_counts(&self, agent_id: &str, window: &DateWindow) -> Result<ActivityCounts> {
        Ok(self.tables.read().counts(agent_id, window))
    }

    async fn activity_counts_for_agents(
        &self,
        agent_ids: &[String],
        window: &DateWindow,
    ) -> Result<HashMap<String, ActivityCounts>> {
        let tables = self.tables.read();
        Ok(agent_ids
            .iter()
            .map(|id| (id.clone(), tables.counts(id, window)))
            .collect())
    }

    async fn list_activities(&self, agent_id: &str) -> Result<Vec<Activity>> {
        Ok(self
            .tables
            .read()
            .activities
            .get(agent_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn sum_sales(&self, agent_id: &str, window: &DateWindow) -> Result<f64> {
        Ok(self.tables.read().sales_total(agent_id, window))
    }

    async fn sum_sales_for_agents(
        &self,
        agent_ids: &[String],
        window: &DateWindow,
    ) -> Result<HashMap<String, f64>> {
        let tables = self.tables.read();
        Ok(agent_ids
            .iter()
            .map(|id| (id.clone(), tables.sales_total(id, window)))
            .collect())
    }

    async fn list_sales(&self, agent_id: &str) -> Result<Vec<Sale>> {
        Ok(self
            .tables
            .read()
            .sales
            .get(agent_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_product(&self, product_id: &str) -> Result<Option<Product>> {
        Ok(self.tables.read().products.get(product_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .insert_division_head(DivisionHead {
                id: "DH01".into(),
                name: "Head".into(),
                email: String::new(),
                division_name: "North".into(),
            })
            .unwrap();
        store
            .insert_area_manager(AreaManager {
                id: "AM01".into(),
                name: "Manager".into(),
                email: String::new(),
                division_head_id: "DH01".into(),
                area_name: "North A".into(),
            })
            .unwrap();
        for id in ["A101", "A102"] {
            store
                .insert_agent(Agent {
                    id: id.into(),
                    name: id.into(),
                    email: String::new(),
                    monthly_target: 500_000.0,
                    area_manager_id: Some("AM01".into()),
                })
                .unwrap();
        }
        store
    }

    fn activity(id: &str, agent: &str, activity_type: ActivityType, month: u32, day: u32) -> Activity {
        Activity {
            id: id.into(),
            agent_id: agent.into(),
            activity_type,
            value: 0.0,
            occurred_at: Utc.with_ymd_and_hms(2026, month, day, 10, 0, 0).unwrap(),
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn test_windowed_counts() {
        let store = store();
        store.record_activity(activity("1", "A101", ActivityType::Call, 10, 1)).unwrap();
        store.record_activity(activity("2", "A101", ActivityType::Call, 10, 31)).unwrap();
        store.record_activity(activity("3", "A101", ActivityType::Lead, 9, 30)).unwrap();
        store.record_activity(activity("4", "A101", ActivityType::Deal, 11, 1)).unwrap();

        let october = DateWindow::month(2026, 10);
        let counts = store.activity_counts("A101", &october).await.unwrap();
        assert_eq!(counts, ActivityCounts::new(2, 0, 0, 0));
        assert_eq!(
            store
                .count_activities("A101", ActivityType::Lead, &DateWindow::month(2026, 9))
                .await
                .unwrap(),
            1
        );
        assert_eq!(store.list_activities("A101").await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_batch_queries_include_idle_agents() {
        let store = store();
        store.record_activity(activity("1", "A101", ActivityType::Meeting, 10, 5)).unwrap();
        store
            .record_sale(Sale {
                id: "S1".into(),
                agent_id: "A101".into(),
                amount: 125_000.0,
                customer: "Customer #1001".into(),
                product_id: None,
                occurred_at: Utc.with_ymd_and_hms(2026, 10, 6, 12, 0, 0).unwrap(),
                notes: String::new(),
            })
            .unwrap();

        let ids = vec!["A101".to_string(), "A102".to_string()];
        let window = DateWindow::month(2026, 10);
        let counts = store.activity_counts_for_agents(&ids, &window).await.unwrap();
        assert_eq!(counts["A101"].meetings, 1);
        assert_eq!(counts["A102"], ActivityCounts::default());

        let totals = store.sum_sales_for_agents(&ids, &window).await.unwrap();
        assert_eq!(totals["A101"], 125_000.0);
        assert_eq!(totals["A102"], 0.0);
    }

    #[tokio::test]
    async fn test_directory_lookups() {
        let store = store();
        assert!(store.get_agent("A101").await.unwrap().is_some());
        assert!(store.get_agent("A999").await.unwrap().is_none());
        assert_eq!(store.list_agents_by_area_manager("AM01").await.unwrap().len(), 2);
        assert_eq!(
            store
                .list_agents_by_area_managers(&["AM01".to_string(), "AM02".to_string()])
                .await
                .unwrap()
                .len(),
            2
        );
        assert_eq!(
            store.list_area_managers_by_division_head("DH01").await.unwrap()[0].id,
            "AM01"
        );
    }

    #[test]
    fn test_rejects_unknown_agent_and_negative_sale() {
        let store = store();
        assert!(store
            .record_activity(activity("1", "A999", ActivityType::Call, 10, 1))
            .is_err());

        let err = store
            .record_sale(Sale {
                id: "S1".into(),
                agent_id: "A101".into(),
                amount: -1.0,
                customer: String::new(),
                product_id: None,
                occurred_at: Utc::now(),
                notes: String::new(),
            })
            .unwrap_err();
        assert!(matches!(err, PersistenceError::InvalidRecord(_)));
    }

    #[test]
    fn test_dataset_round_trip_through_store() {
        let store = store();
        store.record_activity(activity("1", "A102", ActivityType::Call, 10, 2)).unwrap();
        let dataset = store.to_dataset();
        let rebuilt = InMemoryStore::from_dataset(dataset.clone()).unwrap();
        assert_eq!(rebuilt.to_dataset(), dataset);
        assert_eq!(rebuilt.agent_count(), 2);
    }
}
