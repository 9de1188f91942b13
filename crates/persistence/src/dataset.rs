//! JSON dataset snapshots
//!
//! A `Dataset` is the whole organization in one document: the org tree,
//! the product catalog, and every activity and sale. The CLI loads one
//! into an `InMemoryStore`; `DemoOrganization` produces one.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use salesai_core::{Activity, Agent, AreaManager, DivisionHead, Product, Sale};

use crate::PersistenceError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dataset {
    #[serde(default)]
    pub division_heads: Vec<DivisionHead>,
    #[serde(default)]
    pub area_managers: Vec<AreaManager>,
    #[serde(default)]
    pub agents: Vec<Agent>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub sales: Vec<Sale>,
}

impl Dataset {
    /// Read and validate a snapshot
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| PersistenceError::io(path, e))?;
        let dataset: Dataset = serde_json::from_str(&raw)?;
        dataset.validate()?;

        tracing::info!(
            path = %path.display(),
            agents = dataset.agents.len(),
            activities = dataset.activities.len(),
            sales = dataset.sales.len(),
            "Dataset loaded"
        );

        Ok(dataset)
    }

    /// Write the snapshot atomically, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(|e| PersistenceError::io(dir, e))?;

        let body = serde_json::to_vec_pretty(self)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| PersistenceError::io(dir, e))?;
        tmp.write_all(&body).map_err(|e| PersistenceError::io(path, e))?;
        tmp.persist(path)
            .map_err(|e| PersistenceError::io(path, e.error))?;

        tracing::info!(path = %path.display(), agents = self.agents.len(), "Dataset saved");
        Ok(())
    }

    /// Check id uniqueness and that every reference resolves
    pub fn validate(&self) -> Result<(), PersistenceError> {
        let heads = unique_ids("division head", self.division_heads.iter().map(|h| &h.id))?;
        let managers = unique_ids("area manager", self.area_managers.iter().map(|m| &m.id))?;
        let agents = unique_ids("agent", self.agents.iter().map(|a| &a.id))?;
        let products = unique_ids("product", self.products.iter().map(|p| &p.id))?;
        unique_ids("activity", self.activities.iter().map(|a| &a.id))?;
        unique_ids("sale", self.sales.iter().map(|s| &s.id))?;

        for manager in &self.area_managers {
            if !heads.contains(manager.division_head_id.as_str()) {
                return Err(PersistenceError::DanglingReference {
                    entity: "area manager",
                    id: manager.id.clone(),
                    target: "division head",
                    target_id: manager.division_head_id.clone(),
                });
            }
        }

        for agent in &self.agents {
            if !(agent.monthly_target.is_finite() && agent.monthly_target >= 0.0) {
                return Err(PersistenceError::InvalidRecord(format!(
                    "agent {} has monthly_target {}",
                    agent.id, agent.monthly_target
                )));
            }
            if let Some(manager_id) = &agent.area_manager_id {
                if !managers.contains(manager_id.as_str()) {
                    return Err(PersistenceError::DanglingReference {
                        entity: "agent",
                        id: agent.id.clone(),
                        target: "area manager",
                        target_id: manager_id.clone(),
                    });
                }
            }
        }

        for activity in &self.activities {
            if !agents.contains(activity.agent_id.as_str()) {
                return Err(PersistenceError::DanglingReference {
                    entity: "activity",
                    id: activity.id.clone(),
                    target: "agent",
                    target_id: activity.agent_id.clone(),
                });
            }
        }

        for sale in &self.sales {
            if !agents.contains(sale.agent_id.as_str()) {
                return Err(PersistenceError::DanglingReference {
                    entity: "sale",
                    id: sale.id.clone(),
                    target: "agent",
                    target_id: sale.agent_id.clone(),
                });
            }
            if !(sale.amount.is_finite() && sale.amount >= 0.0) {
                return Err(PersistenceError::InvalidRecord(format!(
                    "sale {} has amount {}",
                    sale.id, sale.amount
                )));
            }
            if let Some(product_id) = &sale.product_id {
                if !products.contains(product_id.as_str()) {
                    return Err(PersistenceError::DanglingReference {
                        entity: "sale",
                        id: sale.id.clone(),
                        target: "product",
                        target_id: product_id.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

fn unique_ids<'a>(
    entity: &'static str,
    ids: impl Iterator<Item = &'a String>,
) -> Result<HashSet<&'a str>, PersistenceError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id.as_str()) {
            return Err(PersistenceError::Duplicate {
                entity,
                id: id.clone(),
            });
        }
    }
    Ok(seen)
}
