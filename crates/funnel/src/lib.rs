//! Sales funnel analytics
//!
//! - `metrics`: lifetime stage counts, conversion rates, health tier and
//!   fixed-threshold recommendations
//! - `analyzer`: per-stage comparison with industry benchmarks, bottleneck
//!   detection, funnel score and prioritized recommendations

pub mod analyzer;
pub mod metrics;

pub use analyzer::{
    analyze_stage, potential_improvement, recommendations_for, AiRecommendation, FunnelAnalysis,
    FunnelAnalyzer, FunnelStageAnalysis, InsightKind, OverallHealth, Priority, StageInsight,
    StageStatus,
};
pub use metrics::{
    ConversionRates, DisplayStage, FunnelAiSummary, FunnelCounts, FunnelHealth, FunnelMetrics,
    MetricsRecommendation, StageKey,
};
