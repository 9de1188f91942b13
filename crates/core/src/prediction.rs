//! Forecast output types

use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;

/// Binary forecast class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    /// Target missed (label 0)
    Miss,
    /// Target met or exceeded (label 1)
    Hit,
}

impl Outcome {
    pub fn from_label(label: u8) -> Self {
        if label == 1 {
            Self::Hit
        } else {
            Self::Miss
        }
    }

    pub fn label(&self) -> u8 {
        match self {
            Self::Miss => 0,
            Self::Hit => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Miss => "MISS",
            Self::Hit => "HIT",
        }
    }
}

/// Likelihood tier of an agent missing target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    /// No prediction could be made
    Unknown,
}

impl RiskLevel {
    /// Band a miss probability in `[0, 1]`; each band includes its lower edge
    pub fn from_miss_probability(miss_probability: f64) -> Self {
        if miss_probability >= 0.7 {
            Self::High
        } else if miss_probability >= 0.4 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Forecast for one agent's current month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub agent_id: String,
    pub agent_name: String,
    pub prediction: Outcome,
    /// Highest class probability, percent
    pub confidence: f64,
    /// Percent
    pub probability_hit: f64,
    /// Percent
    pub probability_miss: f64,
    pub risk_level: RiskLevel,
    pub features: FeatureVector,
}
