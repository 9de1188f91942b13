//! Persisted model artifact
//!
//! One JSON document holding the fitted forest and the metadata needed to
//! refuse it when it no longer matches the feature schema.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use salesai_config::ModelConfig;
use salesai_core::{Error, FeatureVector, Result, FEATURE_COUNT};

use crate::forest::RandomForest;
use crate::training::DataSource;

/// Bumped whenever the document layout changes
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PersistedModel {
    pub format_version: u32,
    pub model_id: Uuid,
    /// Feature columns in training order
    pub feature_columns: Vec<String>,
    /// Holdout accuracy in [0, 1]
    pub accuracy: f64,
    pub trained_at: DateTime<Utc>,
    pub training_source: DataSource,
    pub training_examples: usize,
    pub forest: RandomForest,
}

impl PersistedModel {
    pub fn new(
        forest: RandomForest,
        accuracy: f64,
        training_source: DataSource,
        training_examples: usize,
    ) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            model_id: Uuid::new_v4(),
            feature_columns: FeatureVector::column_names(),
            accuracy,
            trained_at: Utc::now(),
            training_source,
            training_examples,
            forest,
        }
    }

    /// Reject artifacts that cannot serve the current feature schema
    pub fn validate(&self) -> Result<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(Error::Persistence(format!(
                "unsupported model format version {} (expected {})",
                self.format_version, FORMAT_VERSION
            )));
        }
        let expected = FeatureVector::column_names();
        if self.feature_columns != expected {
            return Err(Error::SchemaMismatch {
                expected,
                found: self.feature_columns.clone(),
            });
        }
        if self.forest.n_features() != FEATURE_COUNT {
            return Err(Error::Persistence(format!(
                "forest expects {} features, schema has {}",
                self.forest.n_features(),
                FEATURE_COUNT
            )));
        }
        self.forest
            .validate()
            .map_err(|e| Error::Persistence(format!("corrupt forest: {}", e)))
    }
}

/// Reads and writes the artifact at one path
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(&config.artifact_path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn load(&self) -> Result<PersistedModel> {
        if !self.exists() {
            return Err(Error::ModelNotFound {
                path: self.path.display().to_string(),
            });
        }
        let raw = std::fs::read_to_string(&self.path)?;
        let model: PersistedModel = serde_json::from_str(&raw)?;
        model.validate()?;

        tracing::info!(
            path = %self.path.display(),
            model_id = %model.model_id,
            trees = model.forest.n_trees(),
            accuracy = model.accuracy,
            trained_at = %model.trained_at,
            "Model loaded"
        );
        Ok(model)
    }

    /// Write to a temp file in the target directory, then rename over the path
    pub fn save(&self, model: &PersistedModel) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let tmp = tempfile::NamedTempFile::new_in(dir)?;
        let mut writer = BufWriter::new(tmp);
        serde_json::to_writer(&mut writer, model)?;
        writer.flush()?;
        let tmp = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::info!(
            path = %self.path.display(),
            model_id = %model.model_id,
            "Model saved"
        );
        Ok(())
    }
}
