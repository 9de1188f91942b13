//! Organization records: agents and the managers above them

use serde::{Deserialize, Serialize};

/// Sales agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Agent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// Monthly sales target
    pub monthly_target: f64,
    #[serde(default)]
    pub area_manager_id: Option<String>,
}

/// Area manager supervising a team of agents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AreaManager {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub division_head_id: String,
    #[serde(default)]
    pub area_name: String,
}

/// Division head supervising area managers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DivisionHead {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub division_name: String,
}
