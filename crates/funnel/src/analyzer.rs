//! Stage-by-stage funnel analysis against industry benchmarks

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use salesai_config::constants::stage_status;
use salesai_config::{FunnelBenchmarks, FunnelConfig};
use salesai_core::{round_to, ActivityStore, Result};

use crate::metrics::{FunnelAiSummary, FunnelCounts, FunnelMetrics, StageKey};

/// Stage tier from the share of benchmark reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageStatus {
    #[serde(rename = "EXCELLENT")]
    Excellent,
    #[serde(rename = "GOOD")]
    Good,
    #[serde(rename = "NEEDS IMPROVEMENT")]
    NeedsImprovement,
    #[serde(rename = "CRITICAL")]
    Critical,
}

impl StageStatus {
    pub fn from_performance_percentage(percentage: f64) -> Self {
        if percentage >= stage_status::EXCELLENT {
            Self::Excellent
        } else if percentage >= stage_status::GOOD {
            Self::Good
        } else if percentage >= stage_status::NEEDS_IMPROVEMENT {
            Self::NeedsImprovement
        } else {
            Self::Critical
        }
    }
}

/// Funnel-wide tier from the count of weak stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallHealth {
    #[serde(rename = "CRITICAL")]
    Critical,
    #[serde(rename = "NEEDS ATTENTION")]
    NeedsAttention,
    #[serde(rename = "FAIR")]
    Fair,
    #[serde(rename = "GOOD")]
    Good,
    #[serde(rename = "EXCELLENT")]
    Excellent,
}

impl OverallHealth {
    pub fn from_statuses(statuses: impl IntoIterator<Item = StageStatus>) -> Self {
        let (mut critical, mut needs_improvement) = (0, 0);
        for status in statuses {
            match status {
                StageStatus::Critical => critical += 1,
                StageStatus::NeedsImprovement => needs_improvement += 1,
                _ => {}
            }
        }

        match (critical, needs_improvement) {
            (c, _) if c >= 2 => Self::Critical,
            (1, _) => Self::NeedsAttention,
            (_, n) if n >= 2 => Self::Fair,
            (_, 1) => Self::Good,
            _ => Self::Excellent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Warning,
    Info,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageInsight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub message: String,
    pub action: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelStageAnalysis {
    pub name: String,
    pub stage_key: StageKey,
    pub conversion: f64,
    pub benchmark: f64,
    /// Conversion minus benchmark, percentage points
    pub performance_gap: f64,
    /// Conversion as a share of benchmark, percent
    pub performance_percentage: f64,
    pub status: StageStatus,
    pub from_count: u64,
    pub to_count: u64,
    pub insights: Vec<StageInsight>,
    /// Extra conversions this stage would yield at benchmark
    pub potential_improvement: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelAnalysis {
    pub stages_analysis: Vec<FunnelStageAnalysis>,
    /// First CRITICAL stage in funnel order
    pub primary_bottleneck: Option<FunnelStageAnalysis>,
    pub overall_health: OverallHealth,
    /// Mean share of benchmark, capped at 100, one decimal
    pub funnel_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    fn from_rank(rank: usize) -> Self {
        match rank {
            0 => Self::High,
            1 => Self::Medium,
            _ => Self::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiRecommendation {
    pub priority: Priority,
    pub stage: String,
    pub issue: String,
    pub action: String,
    /// "+N conversions"
    pub potential_impact: String,
}

fn stage_name(stage: StageKey) -> &'static str {
    match stage {
        StageKey::CallsToLeads => "Prospecting (Calls to Leads)",
        StageKey::LeadsToMeetings => "Lead Qualification (Leads to Meetings)",
        StageKey::MeetingsToDeals => "Meeting to Proposal (Meetings to Deals)",
        StageKey::DealsToSales => "Deal Closing (Deals to Sales)",
    }
}

fn benchmark_for(benchmarks: &FunnelBenchmarks, stage: StageKey) -> f64 {
    match stage {
        StageKey::CallsToLeads => benchmarks.calls_to_leads,
        StageKey::LeadsToMeetings => benchmarks.leads_to_meetings,
        StageKey::MeetingsToDeals => benchmarks.meetings_to_deals,
        StageKey::DealsToSales => benchmarks.deals_to_sales,
    }
}

/// Analyzes an agent's lifetime funnel
///
/// Metrics come from the full activity and sales history; analysis is a
/// pure function of the metrics and the benchmark table.
pub struct FunnelAnalyzer {
    store: Arc<dyn ActivityStore>,
    config: FunnelConfig,
}

impl FunnelAnalyzer {
    pub fn new(store: Arc<dyn ActivityStore>, config: FunnelConfig) -> Self {
        Self { store, config }
    }

    /// Analyzer with the default benchmark table
    pub fn with_defaults(store: Arc<dyn ActivityStore>) -> Self {
        Self::new(store, FunnelConfig::default())
    }

    pub fn config(&self) -> &FunnelConfig {
        &self.config
    }

    /// Funnel metrics over the agent's entire history
    ///
    /// An agent without history (or unknown to the store) yields all-zero
    /// metrics.
    pub async fn get_funnel_metrics(&self, agent_id: &str) -> Result<FunnelMetrics> {
        let activities = self.store.list_activities(agent_id).await?;
        let sales = self.store.list_sales(agent_id).await?;

        let counts = FunnelCounts::from_history(&activities, &sales);
        tracing::debug!(
            agent_id = %agent_id,
            calls = counts.calls,
            closed_sales = counts.closed_sales,
            "Funnel counts"
        );

        Ok(FunnelMetrics::compute(
            counts,
            &self.config.recommendation_thresholds,
        ))
    }

    pub async fn get_funnel_analysis_for_ai(&self, agent_id: &str) -> Result<FunnelAiSummary> {
        Ok(self.get_funnel_metrics(agent_id).await?.ai_summary())
    }

    pub async fn analyze_funnel_stages(&self, agent_id: &str) -> Result<FunnelAnalysis> {
        let metrics = self.get_funnel_metrics(agent_id).await?;
        Ok(self.analyze_metrics(&metrics))
    }

    /// Prioritized recommendations, at most three stages
    pub async fn get_ai_recommendations(&self, agent_id: &str) -> Result<Vec<AiRecommendation>> {
        let analysis = self.analyze_funnel_stages(agent_id).await?;
        Ok(recommendations_for(&analysis))
    }

    pub fn analyze_metrics(&self, metrics: &FunnelMetrics) -> FunnelAnalysis {
        let stages_analysis: Vec<FunnelStageAnalysis> = StageKey::ALL
            .iter()
            .map(|stage| {
                analyze_stage(
                    *stage,
                    metrics.conversion_rates.get(*stage),
                    benchmark_for(&self.config.benchmarks, *stage),
                    metrics.counts.from_count(*stage),
                    metrics.counts.to_count(*stage),
                )
            })
            .collect();

        let primary_bottleneck = stages_analysis
            .iter()
            .find(|s| s.status == StageStatus::Critical)
            .cloned();
        let overall_health = OverallHealth::from_statuses(stages_analysis.iter().map(|s| s.status));
        let funnel_score = funnel_score(&stages_analysis);

        FunnelAnalysis {
            stages_analysis,
            primary_bottleneck,
            overall_health,
            funnel_score,
        }
    }
}

pub fn analyze_stage(
    stage: StageKey,
    conversion: f64,
    benchmark: f64,
    from_count: u64,
    to_count: u64,
) -> FunnelStageAnalysis {
    let performance_gap = conversion - benchmark;
    let performance_percentage = if benchmark > 0.0 {
        conversion / benchmark * 100.0
    } else {
        0.0
    };
    let status = StageStatus::from_performance_percentage(performance_percentage);

    FunnelStageAnalysis {
        name: stage_name(stage).to_string(),
        stage_key: stage,
        conversion,
        benchmark,
        performance_gap,
        performance_percentage,
        status,
        from_count,
        to_count,
        insights: stage_insights(stage, conversion, benchmark, performance_gap, status),
        potential_improvement: potential_improvement(from_count, to_count, benchmark),
    }
}

fn stage_insights(
    stage: StageKey,
    conversion: f64,
    benchmark: f64,
    performance_gap: f64,
    status: StageStatus,
) -> Vec<StageInsight> {
    let insight = match status {
        StageStatus::Critical => {
            let (title, message, action) = match stage {
                StageKey::CallsToLeads => (
                    "Low Lead Generation",
                    format!(
                        "Only {:.1}% of calls convert to leads (target: {:.0}%)",
                        conversion, benchmark
                    ),
                    "Improve prospect targeting and qualification criteria",
                ),
                StageKey::LeadsToMeetings => (
                    "Poor Meeting Conversion",
                    format!("Only {:.1}% of leads convert to meetings", conversion),
                    "Strengthen follow-up process and value proposition",
                ),
                StageKey::MeetingsToDeals => (
                    "Low Proposal Rate",
                    format!("Only {:.1}% of meetings result in deals", conversion),
                    "Enhance needs discovery and proposal presentation skills",
                ),
                StageKey::DealsToSales => (
                    "Weak Closing Rate",
                    format!("Only {:.1}% of deals close successfully", conversion),
                    "Focus on objection handling and closing techniques",
                ),
            };
            StageInsight {
                kind: InsightKind::Warning,
                title: title.to_string(),
                message,
                action: action.to_string(),
            }
        }
        StageStatus::NeedsImprovement => StageInsight {
            kind: InsightKind::Info,
            title: "Room for Improvement".to_string(),
            message: format!("Conversion at {:.1}% (target: {:.0}%)", conversion, benchmark),
            action: format!(
                "Small improvements here can yield {:.1}% better results",
                performance_gap.abs()
            ),
        },
        StageStatus::Excellent => StageInsight {
            kind: InsightKind::Success,
            title: "Strong Performance".to_string(),
            message: format!("Exceeding benchmark by {:.1}%", performance_gap),
            action: "Maintain current practices and share best practices with team".to_string(),
        },
        StageStatus::Good => return Vec::new(),
    };

    vec![insight]
}

/// Additional conversions at benchmark: `max(0, floor(from × benchmark / 100) − to)`
pub fn potential_improvement(from_count: u64, to_count: u64, benchmark: f64) -> u64 {
    if from_count == 0 {
        return 0;
    }
    let at_benchmark = (from_count as f64 * (benchmark / 100.0)).floor();
    let at_benchmark = if at_benchmark.is_finite() && at_benchmark > 0.0 {
        at_benchmark as u64
    } else {
        0
    };
    at_benchmark.saturating_sub(to_count)
}

fn funnel_score(stages: &[FunnelStageAnalysis]) -> f64 {
    if stages.is_empty() {
        return 0.0;
    }
    let mean = stages.iter().map(|s| s.performance_percentage).sum::<f64>() / stages.len() as f64;
    round_to(mean.min(100.0), 1)
}

/// Rank stages by (critical, potential improvement), keep the top three
///
/// The sort is stable, so ties keep funnel order.
pub fn recommendations_for(analysis: &FunnelAnalysis) -> Vec<AiRecommendation> {
    let mut ranked: Vec<&FunnelStageAnalysis> = analysis.stages_analysis.iter().collect();
    ranked.sort_by(|a, b| {
        let key = |s: &FunnelStageAnalysis| (s.status == StageStatus::Critical, s.potential_improvement);
        key(b).cmp(&key(a))
    });

    ranked
        .into_iter()
        .take(3)
        .enumerate()
        .flat_map(|(rank, stage)| {
            stage.insights.iter().map(move |insight| AiRecommendation {
                priority: Priority::from_rank(rank),
                stage: stage.name.clone(),
                issue: insight.message.clone(),
                action: insight.action.clone(),
                potential_impact: format!("+{} conversions", stage.potential_improvement),
            })
        })
        .collect()
}
