//! Persistence layer for sales forecasting
//!
//! Provides:
//! - `InMemoryStore` implementing the `OrgDirectory` and `ActivityStore` traits
//! - `Dataset` JSON snapshots (load, validate, atomic save)
//! - `DemoOrganization`, a seeded demo dataset generator

pub mod dataset;
pub mod demo;
pub mod error;
pub mod store;

pub use dataset::Dataset;
pub use demo::{DemoOrganization, PerformanceProfile};
pub use error::PersistenceError;
pub use store::InMemoryStore;

use std::path::Path;

/// Load a snapshot from disk straight into a store
pub fn open_dataset(path: impl AsRef<Path>) -> Result<InMemoryStore, PersistenceError> {
    InMemoryStore::from_dataset(Dataset::load(path)?)
}
