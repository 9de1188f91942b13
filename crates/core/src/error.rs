//! Error types shared by every forecasting crate

use thiserror::Error;

/// Result alias used across the core
pub type Result<T> = std::result::Result<T, Error>;

/// Forecasting errors
///
/// Insufficient training data and single-class probability arrays are
/// handled by policy and never show up here.
#[derive(Error, Debug)]
pub enum Error {
    /// Agent, area manager or division head is absent
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Prediction requested before any training run
    #[error("Model not found at {path}. Train the model first (salesai train)")]
    ModelNotFound { path: String },

    /// Persisted model was trained against a different feature layout
    #[error("Model feature schema mismatch: expected {expected:?}, found {found:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// Training could not complete (split, fit or persist)
    #[error("Training failed: {0}")]
    Training(String),

    /// Collaborator (data store) failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn agent_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Agent",
            id: id.into(),
        }
    }

    pub fn area_manager_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Area manager",
            id: id.into(),
        }
    }

    pub fn division_head_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Division head",
            id: id.into(),
        }
    }

    /// Whether the caller should treat this as a missing record
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
