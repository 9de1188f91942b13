//! Activity and sales lookups

use async_trait::async_trait;
use std::collections::HashMap;

use crate::activity::{Activity, ActivityCounts, ActivityType, Product, Sale};
use crate::window::DateWindow;
use crate::Result;

/// Read-only access to logged activities and closed sales
///
/// Windowed methods count records whose timestamp falls in the half-open
/// window. History methods return everything recorded for the agent.
#[async_trait]
pub trait ActivityStore: Send + Sync + 'static {
    /// Number of activities of one type in the window
    async fn count_activities(
        &self,
        agent_id: &str,
        activity_type: ActivityType,
        window: &DateWindow,
    ) -> Result<u64>;

    /// All four activity counts for one agent in the window
    async fn activity_counts(&self, agent_id: &str, window: &DateWindow) -> Result<ActivityCounts> {
        Ok(ActivityCounts {
            calls: self.count_activities(agent_id, ActivityType::Call, window).await?,
            meetings: self.count_activities(agent_id, ActivityType::Meeting, window).await?,
            leads: self.count_activities(agent_id, ActivityType::Lead, window).await?,
            deals: self.count_activities(agent_id, ActivityType::Deal, window).await?,
        })
    }

    /// Activity counts for many agents in one round-trip
    ///
    /// Agents with no activity are present with zero counts.
    async fn activity_counts_for_agents(
        &self,
        agent_ids: &[String],
        window: &DateWindow,
    ) -> Result<HashMap<String, ActivityCounts>> {
        let mut counts = HashMap::with_capacity(agent_ids.len());
        for agent_id in agent_ids {
            counts.insert(agent_id.clone(), self.activity_counts(agent_id, window).await?);
        }
        Ok(counts)
    }

    /// Full activity history of an agent
    async fn list_activities(&self, agent_id: &str) -> Result<Vec<Activity>>;

    /// Sum of sale amounts in the window
    async fn sum_sales(&self, agent_id: &str, window: &DateWindow) -> Result<f64>;

    /// Sales totals for many agents in one round-trip
    async fn sum_sales_for_agents(
        &self,
        agent_ids: &[String],
        window: &DateWindow,
    ) -> Result<HashMap<String, f64>> {
        let mut totals = HashMap::with_capacity(agent_ids.len());
        for agent_id in agent_ids {
            totals.insert(agent_id.clone(), self.sum_sales(agent_id, window).await?);
        }
        Ok(totals)
    }

    /// Full sales history of an agent
    async fn list_sales(&self, agent_id: &str) -> Result<Vec<Sale>>;

    async fn get_product(&self, product_id: &str) -> Result<Option<Product>>;
}
