//! Persistence error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed dataset: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Duplicate {entity} id: {id}")]
    Duplicate { entity: &'static str, id: String },

    #[error("{entity} {id} references unknown {target} {target_id}")]
    DanglingReference {
        entity: &'static str,
        id: String,
        target: &'static str,
        target_id: String,
    },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

impl PersistenceError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

impl From<PersistenceError> for salesai_core::Error {
    fn from(err: PersistenceError) -> Self {
        salesai_core::Error::Persistence(err.to_string())
    }
}
