//! Agent scorecards and organization roll-ups
//!
//! - `scoring`: weighted current-month performance score per agent
//! - `arena`: index-addressed organization tree
//! - `aggregator`: area manager and division head summaries

pub mod aggregator;
pub mod arena;
pub mod scoring;

pub use aggregator::{
    top_product_id, AgentDetail, AgentRollup, AreaPerformance, AreaSummary, DetailOptions,
    DetailOutcome, DivisionPerformance, DivisionSummary, HierarchyAggregator, PredictionOutcome,
    RiskCounts, TopProduct,
};
pub use arena::{NodeId, OrgNode, OrgTree};
pub use scoring::{
    activity_score, sales_score, ActivityScore, ActivityScores, AgentPerformance, PerformanceLevel,
    PerformanceScorer, SalesScore,
};
