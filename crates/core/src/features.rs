//! Fixed-schema feature vector consumed by the forecasting classifier
//!
//! The column order below is the contract between training and serving. A
//! persisted model records it and is rejected at load time if it differs.

use serde::{Deserialize, Serialize};

use crate::activity::ActivityCounts;
use crate::ratio::{per_unit, percent};

/// Number of model input columns
pub const FEATURE_COUNT: usize = 14;

/// Model input columns, in training order
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "calls",
    "meetings",
    "leads",
    "deals",
    "total_sales",
    "monthly_target",
    "sales_percentage",
    "conversion_rate",
    "meeting_to_deal",
    "calls_to_leads_conversion",
    "leads_to_meetings_conversion",
    "meetings_to_deals_conversion",
    "funnel_efficiency",
    "activity_velocity",
];

/// Feature vector for one agent over one window
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureVector {
    pub calls: f64,
    pub meetings: f64,
    pub leads: f64,
    pub deals: f64,
    pub total_sales: f64,
    pub monthly_target: f64,
    pub sales_percentage: f64,
    pub conversion_rate: f64,
    pub meeting_to_deal: f64,
    pub calls_to_leads_conversion: f64,
    pub leads_to_meetings_conversion: f64,
    pub meetings_to_deals_conversion: f64,
    pub funnel_efficiency: f64,
    pub activity_velocity: f64,
}

impl FeatureVector {
    /// Derive every field from raw counts
    ///
    /// Pure: identical inputs always give identical output, and every ratio
    /// resolves to 0 on a zero denominator.
    pub fn from_counts(
        counts: &ActivityCounts,
        total_sales: f64,
        monthly_target: f64,
        days_in_window: i64,
    ) -> Self {
        let calls = counts.calls as f64;
        let meetings = counts.meetings as f64;
        let leads = counts.leads as f64;
        let deals = counts.deals as f64;

        Self {
            calls,
            meetings,
            leads,
            deals,
            total_sales,
            monthly_target,
            sales_percentage: percent(total_sales, monthly_target),
            conversion_rate: percent(deals, leads),
            meeting_to_deal: percent(deals, meetings),
            calls_to_leads_conversion: percent(leads, calls),
            leads_to_meetings_conversion: percent(meetings, leads),
            meetings_to_deals_conversion: percent(deals, meetings),
            funnel_efficiency: percent(deals, calls),
            activity_velocity: per_unit(counts.total() as f64, days_in_window as f64),
        }
    }

    /// Values in [`FEATURE_COLUMNS`] order
    pub fn to_row(&self) -> [f64; FEATURE_COUNT] {
        [
            self.calls,
            self.meetings,
            self.leads,
            self.deals,
            self.total_sales,
            self.monthly_target,
            self.sales_percentage,
            self.conversion_rate,
            self.meeting_to_deal,
            self.calls_to_leads_conversion,
            self.leads_to_meetings_conversion,
            self.meetings_to_deals_conversion,
            self.funnel_efficiency,
            self.activity_velocity,
        ]
    }

    /// Column names as owned strings (artifact metadata)
    pub fn column_names() -> Vec<String> {
        FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formulas() {
        let counts = ActivityCounts::new(100, 40, 20, 10);
        let fv = FeatureVector::from_counts(&counts, 450_000.0, 500_000.0, 30);

        assert_eq!(fv.sales_percentage, 90.0);
        assert_eq!(fv.conversion_rate, 50.0);
        assert_eq!(fv.meeting_to_deal, 25.0);
        assert_eq!(fv.calls_to_leads_conversion, 20.0);
        assert_eq!(fv.leads_to_meetings_conversion, 200.0);
        assert_eq!(fv.meetings_to_deals_conversion, 25.0);
        assert_eq!(fv.funnel_efficiency, 10.0);
        assert_eq!(fv.activity_velocity, 170.0 / 30.0);
    }

    #[test]
    fn test_zero_calls_never_errors() {
        let counts = ActivityCounts::new(0, 5, 3, 2);
        let fv = FeatureVector::from_counts(&counts, 0.0, 500_000.0, 31);

        assert_eq!(fv.calls_to_leads_conversion, 0.0);
        assert_eq!(fv.funnel_efficiency, 0.0);
        assert_eq!(fv.conversion_rate, percent(2.0, 3.0));
        assert!(fv.to_row().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_all_zero_inputs() {
        let fv = FeatureVector::from_counts(&ActivityCounts::default(), 0.0, 0.0, 0);
        assert!(fv.to_row().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_row_matches_column_order() {
        let counts = ActivityCounts::new(1, 2, 3, 4);
        let fv = FeatureVector::from_counts(&counts, 5.0, 6.0, 10);
        let json = serde_json::to_value(fv).unwrap();
        let row = fv.to_row();
        for (i, column) in FEATURE_COLUMNS.iter().enumerate() {
            assert_eq!(json[column].as_f64().unwrap(), row[i], "column {column}");
        }
    }
}
