//! Weighted monthly performance score
//!
//! Five sub-scores in [0, 100] (four activity types and sales against
//! target) combined with the configured weights.

use serde::{Deserialize, Serialize};

use salesai_config::constants::performance::{LEVEL_AVERAGE, LEVEL_EXCELLENT, LEVEL_GOOD};
use salesai_config::PerformanceConfig;
use salesai_core::{percent, round_to, ActivityCounts, Agent, DateWindow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PerformanceLevel {
    Excellent,
    Good,
    Average,
    Poor,
}

impl PerformanceLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= LEVEL_EXCELLENT {
            Self::Excellent
        } else if score >= LEVEL_GOOD {
            Self::Good
        } else if score >= LEVEL_AVERAGE {
            Self::Average
        } else {
            Self::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Average => "Average",
            Self::Poor => "Poor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityScore {
    pub count: u64,
    pub target: u64,
    pub score: f64,
}

impl ActivityScore {
    pub fn new(count: u64, target: u64) -> Self {
        Self {
            count,
            target,
            score: activity_score(count, target),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityScores {
    pub calls: ActivityScore,
    pub meetings: ActivityScore,
    pub leads: ActivityScore,
    pub deals: ActivityScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SalesScore {
    pub actual: f64,
    pub target: f64,
    pub score: f64,
    /// Uncapped share of target, percent
    pub percentage: f64,
}

impl SalesScore {
    pub fn new(actual: f64, target: f64) -> Self {
        Self {
            actual,
            target,
            score: sales_score(actual, target),
            percentage: percent(actual, target),
        }
    }
}

/// One agent's current-month scorecard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPerformance {
    pub agent_id: String,
    pub agent_name: String,
    /// e.g. "October 2026"
    pub month: String,
    pub activities: ActivityScores,
    pub sales: SalesScore,
    /// Rounded to 2 decimals
    pub overall_score: f64,
    pub performance_level: PerformanceLevel,
}

/// `min(100, count / target * 100)`, 0 for a zero target
pub fn activity_score(count: u64, target: u64) -> f64 {
    percent(count as f64, target as f64).min(100.0)
}

/// `min(100, actual / target * 100)`, 0 for a zero target
pub fn sales_score(actual: f64, target: f64) -> f64 {
    percent(actual, target).min(100.0).max(0.0)
}

#[derive(Debug, Clone, Default)]
pub struct PerformanceScorer {
    config: PerformanceConfig,
}

impl PerformanceScorer {
    pub fn new(config: PerformanceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PerformanceConfig {
        &self.config
    }

    pub fn score(
        &self,
        agent: &Agent,
        counts: &ActivityCounts,
        total_sales: f64,
        window: &DateWindow,
    ) -> AgentPerformance {
        let targets = &self.config.targets;
        let weights = &self.config.weights;

        let activities = ActivityScores {
            calls: ActivityScore::new(counts.calls, targets.calls),
            meetings: ActivityScore::new(counts.meetings, targets.meetings),
            leads: ActivityScore::new(counts.leads, targets.leads),
            deals: ActivityScore::new(counts.deals, targets.deals),
        };
        let sales = SalesScore::new(total_sales, agent.monthly_target);

        let overall = activities.calls.score * weights.calls
            + activities.meetings.score * weights.meetings
            + activities.leads.score * weights.leads
            + activities.deals.score * weights.deals
            + sales.score * weights.sales;

        AgentPerformance {
            agent_id: agent.id.clone(),
            agent_name: agent.name.clone(),
            month: window.label(),
            activities,
            sales,
            overall_score: round_to(overall, 2),
            performance_level: PerformanceLevel::from_score(overall),
        }
    }
}
