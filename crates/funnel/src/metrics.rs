//! Funnel metrics over an agent's activity history
//!
//! ```text
//! Prospects (calls) → Qualified Leads → Meetings → Proposals (deals) → Closed Sales
//! ```
//!
//! Every conversion uses `safe_percentage`: 0.0 on a zero denominator,
//! otherwise rounded to two decimals.

use serde::{Deserialize, Serialize};

use salesai_config::constants::funnel_health;
use salesai_config::RecommendationThresholds;
use salesai_core::{safe_percentage, Activity, ActivityCounts, Sale};

/// Stage transition, in funnel order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKey {
    CallsToLeads,
    LeadsToMeetings,
    MeetingsToDeals,
    DealsToSales,
}

impl StageKey {
    pub const ALL: [StageKey; 4] = [
        Self::CallsToLeads,
        Self::LeadsToMeetings,
        Self::MeetingsToDeals,
        Self::DealsToSales,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CallsToLeads => "calls_to_leads",
            Self::LeadsToMeetings => "leads_to_meetings",
            Self::MeetingsToDeals => "meetings_to_deals",
            Self::DealsToSales => "deals_to_sales",
        }
    }
}

impl std::fmt::Display for StageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifetime stage counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunnelCounts {
    pub calls: u64,
    pub leads: u64,
    pub meetings: u64,
    pub deals: u64,
    /// Number of sales, not their amount
    pub closed_sales: u64,
}

impl FunnelCounts {
    pub fn new(activity: ActivityCounts, closed_sales: u64) -> Self {
        Self {
            calls: activity.calls,
            leads: activity.leads,
            meetings: activity.meetings,
            deals: activity.deals,
            closed_sales,
        }
    }

    /// Tally a full history
    pub fn from_history(activities: &[Activity], sales: &[Sale]) -> Self {
        let mut counts = ActivityCounts::default();
        for activity in activities {
            counts.record(activity.activity_type);
        }
        Self::new(counts, sales.len() as u64)
    }

    /// Count entering the given transition
    pub fn from_count(&self, stage: StageKey) -> u64 {
        match stage {
            StageKey::CallsToLeads => self.calls,
            StageKey::LeadsToMeetings => self.leads,
            StageKey::MeetingsToDeals => self.meetings,
            StageKey::DealsToSales => self.deals,
        }
    }

    /// Count leaving the given transition
    pub fn to_count(&self, stage: StageKey) -> u64 {
        match stage {
            StageKey::CallsToLeads => self.leads,
            StageKey::LeadsToMeetings => self.meetings,
            StageKey::MeetingsToDeals => self.deals,
            StageKey::DealsToSales => self.closed_sales,
        }
    }
}

/// Conversion rates, percent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversionRates {
    pub calls_to_leads: f64,
    pub leads_to_meetings: f64,
    pub meetings_to_deals: f64,
    pub deals_to_sales: f64,
    /// Closed sales per call
    pub overall: f64,
}

impl ConversionRates {
    pub fn from_counts(counts: &FunnelCounts) -> Self {
        Self {
            calls_to_leads: safe_percentage(counts.leads as f64, counts.calls as f64),
            leads_to_meetings: safe_percentage(counts.meetings as f64, counts.leads as f64),
            meetings_to_deals: safe_percentage(counts.deals as f64, counts.meetings as f64),
            deals_to_sales: safe_percentage(counts.closed_sales as f64, counts.deals as f64),
            overall: safe_percentage(counts.closed_sales as f64, counts.calls as f64),
        }
    }

    pub fn get(&self, stage: StageKey) -> f64 {
        match stage {
            StageKey::CallsToLeads => self.calls_to_leads,
            StageKey::LeadsToMeetings => self.leads_to_meetings,
            StageKey::MeetingsToDeals => self.meetings_to_deals,
            StageKey::DealsToSales => self.deals_to_sales,
        }
    }

    /// Lowest stage conversion; the first one in funnel order on ties
    pub fn weakest(&self) -> (StageKey, f64) {
        let mut weakest = (StageKey::CallsToLeads, self.calls_to_leads);
        for stage in &StageKey::ALL[1..] {
            let rate = self.get(*stage);
            if rate < weakest.1 {
                weakest = (*stage, rate);
            }
        }
        weakest
    }
}

/// Health tier from overall conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunnelHealth {
    #[serde(rename = "EXCELLENT")]
    Excellent,
    #[serde(rename = "GOOD")]
    Good,
    #[serde(rename = "FAIR")]
    Fair,
    #[serde(rename = "NEEDS IMPROVEMENT")]
    NeedsImprovement,
}

impl FunnelHealth {
    pub fn from_overall(overall: f64) -> Self {
        if overall >= funnel_health::EXCELLENT {
            Self::Excellent
        } else if overall >= funnel_health::GOOD {
            Self::Good
        } else if overall >= funnel_health::FAIR {
            Self::Fair
        } else {
            Self::NeedsImprovement
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "EXCELLENT",
            Self::Good => "GOOD",
            Self::Fair => "FAIR",
            Self::NeedsImprovement => "NEEDS IMPROVEMENT",
        }
    }
}

/// One bar of the five-stage funnel display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayStage {
    pub name: String,
    pub label: String,
    pub count: u64,
    /// Share of calls
    pub percentage: f64,
    /// Absent on the first stage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_from_previous: Option<f64>,
}

/// Fixed-threshold coaching hint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsRecommendation {
    pub stage: String,
    pub issue: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelMetrics {
    pub stages: Vec<DisplayStage>,
    pub conversion_rates: ConversionRates,
    pub counts: FunnelCounts,
    pub funnel_health: FunnelHealth,
    pub weakest_stage: StageKey,
    pub weakest_rate: f64,
    pub recommendations: Vec<MetricsRecommendation>,
    /// Same value as the overall conversion
    pub funnel_efficiency_score: f64,
}

impl FunnelMetrics {
    pub fn compute(counts: FunnelCounts, thresholds: &RecommendationThresholds) -> Self {
        let rates = ConversionRates::from_counts(&counts);
        let (weakest_stage, weakest_rate) = rates.weakest();

        Self {
            stages: display_stages(&counts, &rates),
            conversion_rates: rates,
            counts,
            funnel_health: FunnelHealth::from_overall(rates.overall),
            weakest_stage,
            weakest_rate,
            recommendations: recommendations(&rates, thresholds),
            funnel_efficiency_score: rates.overall,
        }
    }

    pub fn from_history(
        activities: &[Activity],
        sales: &[Sale],
        thresholds: &RecommendationThresholds,
    ) -> Self {
        Self::compute(FunnelCounts::from_history(activities, sales), thresholds)
    }

    pub fn ai_summary(&self) -> FunnelAiSummary {
        FunnelAiSummary {
            overall_conversion: self.conversion_rates.overall,
            calls_to_leads_conversion: self.conversion_rates.calls_to_leads,
            leads_to_meetings_conversion: self.conversion_rates.leads_to_meetings,
            meetings_to_deals_conversion: self.conversion_rates.meetings_to_deals,
            deals_to_sales_conversion: self.conversion_rates.deals_to_sales,
            funnel_efficiency_score: self.funnel_efficiency_score,
            has_bottleneck: !self.recommendations.is_empty(),
            bottleneck_stage: self.weakest_stage,
        }
    }
}

/// Condensed metrics for the forecast report
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FunnelAiSummary {
    pub overall_conversion: f64,
    pub calls_to_leads_conversion: f64,
    pub leads_to_meetings_conversion: f64,
    pub meetings_to_deals_conversion: f64,
    pub deals_to_sales_conversion: f64,
    pub funnel_efficiency_score: f64,
    /// Any fixed-threshold recommendation fired
    pub has_bottleneck: bool,
    pub bottleneck_stage: StageKey,
}

fn display_stages(counts: &FunnelCounts, rates: &ConversionRates) -> Vec<DisplayStage> {
    let calls = counts.calls as f64;
    let stage = |name: &str, label: &str, count: u64, previous: Option<f64>| DisplayStage {
        name: name.to_string(),
        label: label.to_string(),
        count,
        percentage: if previous.is_none() {
            100.0
        } else {
            safe_percentage(count as f64, calls)
        },
        conversion_from_previous: previous,
    };

    vec![
        stage("Prospects", "Calls Made", counts.calls, None),
        stage(
            "Qualified Leads",
            "Leads Generated",
            counts.leads,
            Some(rates.calls_to_leads),
        ),
        stage(
            "Meetings",
            "Meetings Held",
            counts.meetings,
            Some(rates.leads_to_meetings),
        ),
        stage(
            "Proposals",
            "Deals in Progress",
            counts.deals,
            Some(rates.meetings_to_deals),
        ),
        stage(
            "Closed Sales",
            "Sales Closed",
            counts.closed_sales,
            Some(rates.deals_to_sales),
        ),
    ]
}

fn recommendations(
    rates: &ConversionRates,
    thresholds: &RecommendationThresholds,
) -> Vec<MetricsRecommendation> {
    let rules = [
        (
            rates.calls_to_leads < thresholds.calls_to_leads,
            "Lead Qualification",
            "Low call-to-lead conversion",
            "Improve prospect targeting and qualification criteria",
        ),
        (
            rates.leads_to_meetings < thresholds.leads_to_meetings,
            "Meeting Booking",
            "Low lead-to-meeting conversion",
            "Enhance follow-up process and value proposition",
        ),
        (
            rates.meetings_to_deals < thresholds.meetings_to_deals,
            "Deal Creation",
            "Low meeting-to-deal conversion",
            "Strengthen needs assessment and proposal skills",
        ),
        (
            rates.deals_to_sales < thresholds.deals_to_sales,
            "Deal Closing",
            "Low deal-to-sale conversion",
            "Focus on objection handling and closing techniques",
        ),
    ];

    rules
        .into_iter()
        .filter(|(fires, ..)| *fires)
        .map(|(_, stage, issue, suggestion)| MetricsRecommendation {
            stage: stage.to_string(),
            issue: issue.to_string(),
            suggestion: suggestion.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(calls: u64, leads: u64, meetings: u64, deals: u64, closed: u64) -> FunnelCounts {
        FunnelCounts {
            calls,
            leads,
            meetings,
            deals,
            closed_sales: closed,
        }
    }

    #[test]
    fn test_conversion_rates() {
        let rates = ConversionRates::from_counts(&counts(200, 50, 30, 15, 9));
        assert_eq!(rates.calls_to_leads, 25.0);
        assert_eq!(rates.leads_to_meetings, 60.0);
        assert_eq!(rates.meetings_to_deals, 50.0);
        assert_eq!(rates.deals_to_sales, 60.0);
        assert_eq!(rates.overall, 4.5);
    }

    #[test]
    fn test_rates_are_rounded_to_two_places() {
        let rates = ConversionRates::from_counts(&counts(3, 1, 0, 0, 0));
        assert_eq!(rates.calls_to_leads, 33.33);
    }

    #[test]
    fn test_empty_history_is_all_zero() {
        let metrics = FunnelMetrics::compute(FunnelCounts::default(), &Default::default());
        assert_eq!(metrics.conversion_rates, ConversionRates::default());
        assert_eq!(metrics.funnel_health, FunnelHealth::NeedsImprovement);
        assert_eq!(metrics.weakest_stage, StageKey::CallsToLeads);
        assert_eq!(metrics.weakest_rate, 0.0);
        assert_eq!(metrics.recommendations.len(), 4);
        assert_eq!(metrics.stages[0].percentage, 100.0);
        assert_eq!(metrics.stages[4].percentage, 0.0);
    }

    #[test]
    fn test_weakest_stage_takes_first_minimum() {
        // leads_to_meetings and deals_to_sales tie at 50
        let rates = ConversionRates::from_counts(&counts(100, 60, 30, 24, 12));
        assert_eq!(rates.weakest(), (StageKey::LeadsToMeetings, 50.0));
    }

    #[test]
    fn test_funnel_health_tiers() {
        assert_eq!(FunnelHealth::from_overall(10.0), FunnelHealth::Excellent);
        assert_eq!(FunnelHealth::from_overall(9.99), FunnelHealth::Good);
        assert_eq!(FunnelHealth::from_overall(5.0), FunnelHealth::Good);
        assert_eq!(FunnelHealth::from_overall(2.0), FunnelHealth::Fair);
        assert_eq!(FunnelHealth::from_overall(1.99), FunnelHealth::NeedsImprovement);
    }

    #[test]
    fn test_recommendations_use_fixed_thresholds() {
        // 20% calls→leads is below the 25 benchmark but not under the 20 floor
        let metrics = FunnelMetrics::compute(counts(100, 20, 12, 8, 6), &Default::default());
        let stages: Vec<&str> = metrics.recommendations.iter().map(|r| r.stage.as_str()).collect();
        assert_eq!(stages, Vec::<&str>::new());

        let metrics = FunnelMetrics::compute(counts(100, 19, 7, 3, 1), &Default::default());
        let stages: Vec<&str> = metrics.recommendations.iter().map(|r| r.stage.as_str()).collect();
        assert_eq!(
            stages,
            vec!["Lead Qualification", "Meeting Booking", "Deal Creation", "Deal Closing"]
        );
    }

    #[test]
    fn test_display_stages() {
        let metrics = FunnelMetrics::compute(counts(100, 25, 10, 5, 2), &Default::default());
        let names: Vec<&str> = metrics.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Prospects", "Qualified Leads", "Meetings", "Proposals", "Closed Sales"]
        );
        assert_eq!(metrics.stages[0].conversion_from_previous, None);
        assert_eq!(metrics.stages[2].percentage, 10.0);
        assert_eq!(metrics.stages[2].conversion_from_previous, Some(40.0));
        assert_eq!(metrics.stages[4].conversion_from_previous, Some(40.0));
    }

    #[test]
    fn test_ai_summary() {
        let metrics = FunnelMetrics::compute(counts(100, 30, 20, 15, 12), &Default::default());
        let summary = metrics.ai_summary();
        assert_eq!(summary.overall_conversion, 12.0);
        assert_eq!(summary.funnel_efficiency_score, 12.0);
        assert!(!summary.has_bottleneck);
        assert_eq!(summary.bottleneck_stage, StageKey::CallsToLeads);
    }

    #[test]
    fn test_health_serializes_with_space() {
        let json = serde_json::to_string(&FunnelHealth::NeedsImprovement).unwrap();
        assert_eq!(json, "\"NEEDS IMPROVEMENT\"");
        assert_eq!(serde_json::to_string(&StageKey::DealsToSales).unwrap(), "\"deals_to_sales\"");
    }
}
