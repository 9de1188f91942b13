//! Area and division roll-ups
//!
//! Each roll-up builds an [`OrgTree`] from batch directory queries, fetches
//! current-month counts and sales for all of its agents in one call each,
//! then walks the tree children-first.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use salesai_config::PerformanceConfig;
use salesai_core::{
    percent, round_to, Activity, ActivityStore, Agent, AreaManager, Clock, DivisionHead, Error,
    OrgDirectory, Prediction, Product, Result, RiskLevel, Sale, SalesRepository,
};
use salesai_forecast::{predict_prefetched, Predictor};
use salesai_funnel::FunnelMetrics;

use crate::arena::{NodeId, OrgNode, OrgTree};
use crate::scoring::{AgentPerformance, PerformanceScorer};

/// Prediction for one agent inside a roll-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PredictionOutcome {
    Available(Prediction),
    Unavailable { reason: String },
}

impl PredictionOutcome {
    pub fn risk_level(&self) -> RiskLevel {
        match self {
            Self::Available(p) => p.risk_level,
            Self::Unavailable { .. } => RiskLevel::Unknown,
        }
    }

    pub fn prediction(&self) -> Option<&Prediction> {
        match self {
            Self::Available(p) => Some(p),
            Self::Unavailable { .. } => None,
        }
    }
}

/// Optional per-agent extras; the default fetches none of them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DetailOptions {
    pub funnel: bool,
    /// Most recent activities to include, 0 for none
    pub recent_activities: usize,
    /// Most recent sales to include, 0 for none
    pub recent_sales: usize,
    pub top_product: bool,
}

impl DetailOptions {
    pub fn full() -> Self {
        Self {
            funnel: true,
            recent_activities: 10,
            recent_sales: 5,
            top_product: true,
        }
    }

    fn any(&self) -> bool {
        self.funnel || self.recent_activities > 0 || self.recent_sales > 0 || self.top_product
    }
}

/// Product with the highest lifetime sold amount for an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProduct {
    pub product_id: String,
    /// `None` when the catalog no longer has the product
    pub product: Option<Product>,
    pub total_amount: f64,
    pub sales_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funnel: Option<FunnelMetrics>,
    pub recent_activities: Vec<Activity>,
    pub recent_sales: Vec<Sale>,
    pub top_product: Option<TopProduct>,
}

/// Requested detail for one agent, or why it could not be fetched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DetailOutcome {
    Available(AgentDetail),
    Unavailable { reason: String },
}

impl DetailOutcome {
    pub fn detail(&self) -> Option<&AgentDetail> {
        match self {
            Self::Available(detail) => Some(detail),
            Self::Unavailable { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRollup {
    pub agent: Agent,
    pub agent_id: String,
    pub performance: AgentPerformance,
    pub prediction: PredictionOutcome,
    /// Present only when detail options were requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<DetailOutcome>,
}

/// Agents per risk tier
///
/// UNKNOWN is tracked so the tiers always add up to the agent count, but it
/// is not part of the published summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RiskCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub unknown: usize,
}

impl RiskCounts {
    pub fn record(&mut self, risk: RiskLevel) {
        match risk {
            RiskLevel::High => self.high += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::Low => self.low += 1,
            RiskLevel::Unknown => self.unknown += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaSummary {
    pub total_agents: usize,
    pub total_sales: f64,
    pub total_target: f64,
    pub achievement_percentage: f64,
    pub average_score: f64,
    pub high_risk_count: usize,
    pub medium_risk_count: usize,
    pub low_risk_count: usize,
}

impl AreaSummary {
    pub fn from_agents(agents: &[AgentRollup]) -> Self {
        if agents.is_empty() {
            return Self::default();
        }

        let mut risks = RiskCounts::default();
        let mut total_sales = 0.0;
        let mut total_target = 0.0;
        let mut total_score = 0.0;
        for rollup in agents {
            total_sales += rollup.performance.sales.actual;
            total_target += rollup.performance.sales.target;
            total_score += rollup.performance.overall_score;
            risks.record(rollup.prediction.risk_level());
        }

        Self {
            total_agents: agents.len(),
            total_sales,
            total_target,
            achievement_percentage: percent(total_sales, total_target),
            average_score: round_to(total_score / agents.len() as f64, 2),
            high_risk_count: risks.high,
            medium_risk_count: risks.medium,
            low_risk_count: risks.low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaPerformance {
    pub manager: AreaManager,
    pub manager_id: String,
    pub agents: Vec<AgentRollup>,
    pub summary: AreaSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DivisionSummary {
    pub total_areas: usize,
    pub total_agents: usize,
    pub total_sales: f64,
    pub total_target: f64,
    pub achievement_percentage: f64,
    pub average_score: f64,
    pub high_risk_count: usize,
    pub medium_risk_count: usize,
    pub low_risk_count: usize,
}

impl DivisionSummary {
    /// Team-size weighted average of the area averages
    pub fn from_areas(areas: &[AreaSummary]) -> Self {
        if areas.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total_areas: areas.len(),
            ..Self::default()
        };
        let mut weighted_score = 0.0;
        for area in areas {
            summary.total_agents += area.total_agents;
            summary.total_sales += area.total_sales;
            summary.total_target += area.total_target;
            summary.high_risk_count += area.high_risk_count;
            summary.medium_risk_count += area.medium_risk_count;
            summary.low_risk_count += area.low_risk_count;
            weighted_score += area.average_score * area.total_agents as f64;
        }
        summary.achievement_percentage = percent(summary.total_sales, summary.total_target);
        if summary.total_agents > 0 {
            summary.average_score = round_to(weighted_score / summary.total_agents as f64, 2);
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivisionPerformance {
    pub division_head: DivisionHead,
    pub head_id: String,
    pub areas: Vec<AreaPerformance>,
    pub summary: DivisionSummary,
}

/// Result of rolling up one tree node
enum Rolled {
    Agent(Box<AgentRollup>),
    Area(AreaPerformance),
    Division(DivisionPerformance),
}

pub struct HierarchyAggregator {
    directory: Arc<dyn OrgDirectory>,
    store: Arc<dyn ActivityStore>,
    predictor: Arc<Predictor>,
    scorer: PerformanceScorer,
    clock: Arc<dyn Clock>,
    detail: DetailOptions,
}

impl HierarchyAggregator {
    pub fn new<R: SalesRepository>(
        repo: Arc<R>,
        predictor: Arc<Predictor>,
        clock: Arc<dyn Clock>,
        config: PerformanceConfig,
    ) -> Self {
        Self {
            directory: repo.clone(),
            store: repo,
            predictor,
            scorer: PerformanceScorer::new(config),
            clock,
            detail: DetailOptions::default(),
        }
    }

    pub fn with_detail(mut self, detail: DetailOptions) -> Self {
        self.detail = detail;
        self
    }

    /// Current-month scorecard for one agent
    pub async fn get_agent_performance(&self, agent_id: &str) -> Result<AgentPerformance> {
        let agent = self
            .directory
            .get_agent(agent_id)
            .await?
            .ok_or_else(|| Error::agent_not_found(agent_id))?;
        let window = self.clock.current_month();
        let counts = self.store.activity_counts(agent_id, &window).await?;
        let sales = self.store.sum_sales(agent_id, &window).await?;
        Ok(self.scorer.score(&agent, &counts, sales, &window))
    }

    /// Scorecards for every agent, two batch queries in total
    pub async fn get_all_agents_performance(&self) -> Result<Vec<AgentPerformance>> {
        let agents = self.directory.list_agents().await?;
        let ids: Vec<String> = agents.iter().map(|a| a.id.clone()).collect();
        let window = self.clock.current_month();
        let counts = self.store.activity_counts_for_agents(&ids, &window).await?;
        let sales = self.store.sum_sales_for_agents(&ids, &window).await?;

        Ok(agents
            .iter()
            .map(|agent| {
                self.scorer.score(
                    agent,
                    &counts.get(&agent.id).copied().unwrap_or_default(),
                    sales.get(&agent.id).copied().unwrap_or(0.0),
                    &window,
                )
            })
            .collect())
    }

    pub async fn get_area_manager_performance(&self, manager_id: &str) -> Result<AreaPerformance> {
        let manager = self
            .directory
            .get_area_manager(manager_id)
            .await?
            .ok_or_else(|| Error::area_manager_not_found(manager_id))?;
        let agents = self.directory.list_agents_by_area_manager(manager_id).await?;

        let (tree, root) = OrgTree::area(manager, agents);
        match self.roll_up(&tree, root).await? {
            Rolled::Area(area) => Ok(area),
            _ => Err(Error::InvalidInput(format!("{} is not an area node", manager_id))),
        }
    }

    pub async fn get_division_head_performance(&self, head_id: &str) -> Result<DivisionPerformance> {
        let head = self
            .directory
            .get_division_head(head_id)
            .await?
            .ok_or_else(|| Error::division_head_not_found(head_id))?;
        let areas = self.directory.list_area_managers_by_division_head(head_id).await?;
        let area_ids: Vec<String> = areas.iter().map(|m| m.id.clone()).collect();
        let agents = if area_ids.is_empty() {
            Vec::new()
        } else {
            self.directory.list_agents_by_area_managers(&area_ids).await?
        };

        let (tree, root) = OrgTree::division(head, areas, agents);
        match self.roll_up(&tree, root).await? {
            Rolled::Division(division) => Ok(division),
            _ => Err(Error::InvalidInput(format!("{} is not a division node", head_id))),
        }
    }

    async fn roll_up(&self, tree: &OrgTree, root: NodeId) -> Result<Rolled> {
        let mut agent_rollups = self.agent_rollups(tree, root).await?;

        let mut rolled: Vec<Option<Rolled>> = (0..tree.len()).map(|_| None).collect();
        for id in tree.post_order(root) {
            let value = match tree.node(id) {
                Some(OrgNode::Agent(agent)) => match agent_rollups.remove(&id) {
                    Some(rollup) => Rolled::Agent(Box::new(rollup)),
                    None => {
                        tracing::warn!(agent_id = %agent.id, node = id, "Agent node has no roll-up, leaving it out");
                        continue;
                    }
                },
                Some(OrgNode::Area(manager)) => {
                    let agents: Vec<AgentRollup> = tree
                        .children(id)
                        .iter()
                        .filter_map(|c| match rolled[*c].take() {
                            Some(Rolled::Agent(rollup)) => Some(*rollup),
                            _ => None,
                        })
                        .collect();
                    let summary = AreaSummary::from_agents(&agents);
                    Rolled::Area(AreaPerformance {
                        manager: manager.clone(),
                        manager_id: manager.id.clone(),
                        agents,
                        summary,
                    })
                }
                Some(OrgNode::Division(head)) => {
                    let areas: Vec<AreaPerformance> = tree
                        .children(id)
                        .iter()
                        .filter_map(|c| match rolled[*c].take() {
                            Some(Rolled::Area(area)) => Some(area),
                            _ => None,
                        })
                        .collect();
                    let summaries: Vec<AreaSummary> = areas.iter().map(|a| a.summary.clone()).collect();
                    Rolled::Division(DivisionPerformance {
                        division_head: head.clone(),
                        head_id: head.id.clone(),
                        summary: DivisionSummary::from_areas(&summaries),
                        areas,
                    })
                }
                None => continue,
            };
            rolled[id] = Some(value);
        }

        rolled
            .get_mut(root)
            .and_then(Option::take)
            .ok_or_else(|| Error::InvalidInput(format!("node {} is not in the tree", root)))
    }

    /// Scorecard, prediction and detail for every agent node under `root`
    ///
    /// Counts and sales come from one batch query each and the model is
    /// loaded once, so the only per-agent store calls are opt-in detail.
    async fn agent_rollups(&self, tree: &OrgTree, root: NodeId) -> Result<HashMap<NodeId, AgentRollup>> {
        let agents = tree.agents_under(root);
        let mut rollups = HashMap::with_capacity(agents.len());
        if agents.is_empty() {
            return Ok(rollups);
        }

        let ids = tree.agent_ids_under(root);
        let window = self.clock.current_month();
        let counts = self.store.activity_counts_for_agents(&ids, &window).await?;
        let sales = self.store.sum_sales_for_agents(&ids, &window).await?;

        let model = self.predictor.load_model();
        if let Err(e) = &model {
            tracing::warn!(agents = agents.len(), error = %e, "Predictions unavailable for roll-up");
        }

        for (node, agent) in agents {
            let agent_counts = counts.get(&agent.id).copied().unwrap_or_default();
            let agent_sales = sales.get(&agent.id).copied().unwrap_or(0.0);
            let performance = self.scorer.score(agent, &agent_counts, agent_sales, &window);

            let prediction = match &model {
                Ok(model) => PredictionOutcome::Available(predict_prefetched(
                    model,
                    agent,
                    &agent_counts,
                    agent_sales,
                    &window,
                )),
                Err(e) => PredictionOutcome::Unavailable {
                    reason: e.to_string(),
                },
            };

            let detail = if self.detail.any() {
                Some(match self.agent_detail(&agent.id).await {
                    Ok(detail) => DetailOutcome::Available(detail),
                    Err(e) => {
                        tracing::warn!(agent_id = %agent.id, error = %e, "Agent detail unavailable");
                        DetailOutcome::Unavailable {
                            reason: e.to_string(),
                        }
                    }
                })
            } else {
                None
            };

            rollups.insert(
                node,
                AgentRollup {
                    agent: agent.clone(),
                    agent_id: agent.id.clone(),
                    performance,
                    prediction,
                    detail,
                },
            );
        }
        Ok(rollups)
    }

    async fn agent_detail(&self, agent_id: &str) -> Result<AgentDetail> {
        let mut detail = AgentDetail::default();

        if self.detail.funnel {
            detail.funnel = Some(self.predictor.funnel().get_funnel_metrics(agent_id).await?);
        }
        if self.detail.recent_activities > 0 {
            let mut activities = self.store.list_activities(agent_id).await?;
            activities.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
            activities.truncate(self.detail.recent_activities);
            detail.recent_activities = activities;
        }
        if self.detail.recent_sales > 0 || self.detail.top_product {
            let mut sales = self.store.list_sales(agent_id).await?;
            if self.detail.top_product {
                detail.top_product = match top_product_id(&sales) {
                    Some((product_id, total_amount, sales_count)) => Some(TopProduct {
                        product: self.store.get_product(&product_id).await?,
                        product_id,
                        total_amount,
                        sales_count,
                    }),
                    None => None,
                };
            }
            sales.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
            sales.truncate(self.detail.recent_sales);
            detail.recent_sales = sales;
        }
        Ok(detail)
    }
}

/// Product id with the highest summed amount; the smallest id wins ties
pub fn top_product_id(sales: &[Sale]) -> Option<(String, f64, usize)> {
    let mut totals: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for sale in sales {
        if let Some(product_id) = sale.product_id.as_deref() {
            let entry = totals.entry(product_id).or_insert((0.0, 0));
            entry.0 += sale.amount;
            entry.1 += 1;
        }
    }

    let mut best: Option<(&str, f64, usize)> = None;
    for (id, (amount, count)) in totals {
        if best.map_or(true, |(_, top, _)| amount > top) {
            best = Some((id, amount, count));
        }
    }
    best.map(|(id, amount, count)| (id.to_string(), amount, count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn summary(agents: usize, average: f64) -> AreaSummary {
        AreaSummary {
            total_agents: agents,
            average_score: average,
            ..AreaSummary::default()
        }
    }

    #[test]
    fn test_division_average_is_weighted_by_team_size() {
        let division = DivisionSummary::from_areas(&[summary(3, 90.0), summary(7, 50.0)]);
        assert_eq!(division.average_score, 62.0);
        assert_eq!(division.total_agents, 10);
        assert_eq!(division.total_areas, 2);
    }

    #[test]
    fn test_division_achievement_uses_division_totals() {
        let a = AreaSummary {
            total_agents: 1,
            total_sales: 300.0,
            total_target: 1_000.0,
            achievement_percentage: 30.0,
            average_score: 40.0,
            high_risk_count: 1,
            ..AreaSummary::default()
        };
        let b = AreaSummary {
            total_agents: 1,
            total_sales: 900.0,
            total_target: 1_000.0,
            achievement_percentage: 90.0,
            average_score: 80.0,
            low_risk_count: 1,
            ..AreaSummary::default()
        };
        let division = DivisionSummary::from_areas(&[a, b]);
        assert_eq!(division.achievement_percentage, 60.0);
        assert_eq!(division.high_risk_count, 1);
        assert_eq!(division.low_risk_count, 1);
    }

    #[test]
    fn test_empty_summaries_are_zero() {
        assert_eq!(AreaSummary::from_agents(&[]), AreaSummary::default());
        assert_eq!(DivisionSummary::from_areas(&[]), DivisionSummary::default());

        let no_agents = DivisionSummary::from_areas(&[summary(0, 0.0)]);
        assert_eq!(no_agents.total_areas, 1);
        assert_eq!(no_agents.average_score, 0.0);
        assert_eq!(no_agents.achievement_percentage, 0.0);
    }

    #[test]
    fn test_unavailable_prediction_is_unknown_risk() {
        let outcome = PredictionOutcome::Unavailable {
            reason: "Model not found".into(),
        };
        assert_eq!(outcome.risk_level(), RiskLevel::Unknown);
        assert!(outcome.prediction().is_none());

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["reason"], "Model not found");
    }

    fn sale(id: &str, product: Option<&str>, amount: f64) -> Sale {
        Sale {
            id: id.into(),
            agent_id: "A1".into(),
            amount,
            customer: "Customer".into(),
            product_id: product.map(str::to_string),
            occurred_at: Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_top_product_by_amount() {
        let sales = vec![
            sale("S1", Some("LOAN-001"), 100.0),
            sale("S2", Some("CARD-001"), 150.0),
            sale("S3", Some("LOAN-001"), 100.0),
            sale("S4", None, 1_000.0),
        ];
        assert_eq!(top_product_id(&sales), Some(("LOAN-001".to_string(), 200.0, 2)));
        assert_eq!(top_product_id(&[]), None);

        let tied = vec![sale("S1", Some("B"), 50.0), sale("S2", Some("A"), 50.0)];
        assert_eq!(top_product_id(&tied).unwrap().0, "A");
    }
}
