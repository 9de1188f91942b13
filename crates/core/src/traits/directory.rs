//! Organization directory lookups

use async_trait::async_trait;

use crate::org::{Agent, AreaManager, DivisionHead};
use crate::Result;

/// Read-only access to the agent / area manager / division head records
///
/// Implementations:
/// - `InMemoryStore` - dataset snapshot held in memory
///
/// Every call is assumed to be already scoped to one organization.
///
/// # Example
///
/// ```ignore
/// let directory: Arc<dyn OrgDirectory> = Arc::new(InMemoryStore::new());
/// let agent = directory.get_agent("AG001").await?;
/// ```
#[async_trait]
pub trait OrgDirectory: Send + Sync + 'static {
    /// Fetch one agent, `None` if absent
    async fn get_agent(&self, agent_id: &str) -> Result<Option<Agent>>;

    /// All agents in scope
    async fn list_agents(&self) -> Result<Vec<Agent>>;

    /// Agents reporting directly to an area manager
    async fn list_agents_by_area_manager(&self, manager_id: &str) -> Result<Vec<Agent>>;

    /// Agents reporting to any of the given area managers, in one round-trip
    ///
    /// The default falls back to one call per manager; stores should
    /// override it with a single query.
    async fn list_agents_by_area_managers(&self, manager_ids: &[String]) -> Result<Vec<Agent>> {
        let mut agents = Vec::new();
        for manager_id in manager_ids {
            agents.extend(self.list_agents_by_area_manager(manager_id).await?);
        }
        Ok(agents)
    }

    async fn get_area_manager(&self, manager_id: &str) -> Result<Option<AreaManager>>;

    async fn list_area_managers_by_division_head(&self, head_id: &str)
        -> Result<Vec<AreaManager>>;

    async fn get_division_head(&self, head_id: &str) -> Result<Option<DivisionHead>>;
}
