//! Core traits and types for sales forecasting
//!
//! This crate provides foundational types used across all other crates:
//! - Organization and activity records
//! - Calendar-month windows and the clock
//! - The fixed-schema feature vector
//! - Forecast output types
//! - Collaborator traits for the data layer
//! - Error types

pub mod activity;
pub mod error;
pub mod features;
pub mod org;
pub mod prediction;
pub mod ratio;
pub mod traits;
pub mod window;

pub use activity::{Activity, ActivityCounts, ActivityType, Product, Sale};
pub use error::{Error, Result};
pub use features::{FeatureVector, FEATURE_COLUMNS, FEATURE_COUNT};
pub use org::{Agent, AreaManager, DivisionHead};
pub use prediction::{Outcome, Prediction, RiskLevel};
pub use ratio::{per_unit, percent, round_to, safe_percentage};
pub use traits::{ActivityStore, OrgDirectory, SalesRepository};
pub use window::{Clock, DateWindow, FixedClock, SystemClock};
