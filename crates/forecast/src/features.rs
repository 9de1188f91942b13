//! Feature extraction from the activity store

use std::sync::Arc;

use salesai_core::{ActivityStore, DateWindow, FeatureVector, Result};

/// Fetches counts and sales for a window and derives the feature vector
#[derive(Clone)]
pub struct FeatureBuilder {
    store: Arc<dyn ActivityStore>,
}

impl FeatureBuilder {
    pub fn new(store: Arc<dyn ActivityStore>) -> Self {
        Self { store }
    }

    pub async fn build(
        &self,
        agent_id: &str,
        monthly_target: f64,
        window: &DateWindow,
    ) -> Result<FeatureVector> {
        let counts = self.store.activity_counts(agent_id, window).await?;
        let total_sales = self.store.sum_sales(agent_id, window).await?;

        tracing::debug!(
            agent_id,
            window = %window.label(),
            calls = counts.calls,
            deals = counts.deals,
            total_sales,
            "Built feature vector"
        );

        Ok(FeatureVector::from_counts(
            &counts,
            total_sales,
            monthly_target,
            window.days(),
        ))
    }
}
