//! Activity and sales records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Activity kinds tracked for every agent
///
/// Stored and read under a single field name (`activity_type`) everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Call,
    Meeting,
    Lead,
    Deal,
}

impl ActivityType {
    pub const ALL: [ActivityType; 4] = [Self::Call, Self::Meeting, Self::Lead, Self::Deal];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Call => "call",
            Self::Meeting => "meeting",
            Self::Lead => "lead",
            Self::Deal => "deal",
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single logged activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Activity {
    pub id: String,
    pub agent_id: String,
    pub activity_type: ActivityType,
    #[serde(default)]
    pub value: f64,
    pub occurred_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
}

/// A closed sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sale {
    pub id: String,
    pub agent_id: String,
    pub amount: f64,
    pub customer: String,
    #[serde(default)]
    pub product_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
}

/// Product catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// Commission in percent
    #[serde(default)]
    pub commission_rate: f64,
}

/// Activity counts over one window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityCounts {
    pub calls: u64,
    pub meetings: u64,
    pub leads: u64,
    pub deals: u64,
}

impl ActivityCounts {
    pub fn new(calls: u64, meetings: u64, leads: u64, deals: u64) -> Self {
        Self {
            calls,
            meetings,
            leads,
            deals,
        }
    }

    pub fn get(&self, activity_type: ActivityType) -> u64 {
        match activity_type {
            ActivityType::Call => self.calls,
            ActivityType::Meeting => self.meetings,
            ActivityType::Lead => self.leads,
            ActivityType::Deal => self.deals,
        }
    }

    pub fn record(&mut self, activity_type: ActivityType) {
        match activity_type {
            ActivityType::Call => self.calls += 1,
            ActivityType::Meeting => self.meetings += 1,
            ActivityType::Lead => self.leads += 1,
            ActivityType::Deal => self.deals += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.calls + self.meetings + self.leads + self.deals
    }
}
