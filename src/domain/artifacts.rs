//! The trained artifact set and its load-time consistency rules.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::catalog::CategoryCatalog;
use super::classifier::LogisticModel;
use super::layout::{FeatureLayout, LayoutError};
use super::scaler::StandardScaler;

/// Artifact file names inside an artifact directory.
pub const MODEL_FILE: &str = "model.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const FEATURE_NAMES_FILE: &str = "feature_names.json";
pub const CATALOG_FILE: &str = "categorical_info.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Files bound together by the manifest.
pub const ARTIFACT_FILES: [&str; 4] = [MODEL_FILE, SCALER_FILE, FEATURE_NAMES_FILE, CATALOG_FILE];

/// Manifest format version written by this crate.
pub const MANIFEST_VERSION: u32 = 1;

/// Errors that make the prediction feature unavailable. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact {file} is corrupt: {reason}")]
    Corrupt { file: String, reason: String },

    #[error("Artifact {file} does not match its manifest hash")]
    Integrity { file: String },

    #[error("Artifacts are inconsistent: {0}")]
    Inconsistent(String),

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// The four objects produced by training.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactSet {
    pub model: LogisticModel,
    pub scaler: StandardScaler,
    pub feature_names: Vec<String>,
    pub catalog: CategoryCatalog,
}

impl ArtifactSet {
    /// Check that the four artifacts belong together and resolve the layout.
    ///
    /// # Errors
    /// Returns `ArtifactError::Inconsistent` or `ArtifactError::Layout`.
    pub fn validate(&self) -> Result<FeatureLayout, ArtifactError> {
        self.model
            .check()
            .map_err(|reason| ArtifactError::Corrupt {
                file: MODEL_FILE.to_string(),
                reason,
            })?;
        self.scaler
            .check()
            .map_err(|reason| ArtifactError::Corrupt {
                file: SCALER_FILE.to_string(),
                reason,
            })?;

        let n = self.feature_names.len();
        if self.scaler.width() != n {
            return Err(ArtifactError::Inconsistent(format!(
                "scaler has {} columns but there are {n} feature names",
                self.scaler.width()
            )));
        }
        if self.model.width() != n {
            return Err(ArtifactError::Inconsistent(format!(
                "model has {} coefficients but there are {n} feature names",
                self.model.width()
            )));
        }

        Ok(FeatureLayout::resolve(&self.feature_names, &self.catalog)?)
    }
}

/// Binds an artifact set: SHA-256 of each file plus provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactManifest {
    pub version: u32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub feature_count: usize,
    /// File name to lowercase hex SHA-256.
    pub files: std::collections::BTreeMap<String, String>,
}
