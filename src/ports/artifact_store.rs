//! Artifact store port: Trait for persisting the trained artifact set.
//!
//! This trait abstracts where artifacts live (a directory of JSON files)
//! from training and prediction.

use crate::domain::{ArtifactError, ArtifactSet};

/// Trait for artifact persistence.
///
/// A store hands out whole sets only: a partially written or mixed set must
/// never be observable through `load`.
pub trait ArtifactStore: Send + Sync {
    /// Load and verify the complete artifact set.
    ///
    /// # Errors
    /// Returns `ArtifactError` if any artifact is missing, corrupt, fails
    /// its integrity check, or disagrees with the others.
    fn load(&self) -> Result<ArtifactSet, ArtifactError>;

    /// Persist a complete artifact set, replacing the current one atomically.
    ///
    /// # Errors
    /// Returns `ArtifactError` if writing fails; the previous set is kept.
    fn save(&self, artifacts: &ArtifactSet) -> Result<(), ArtifactError>;

    /// Check if an artifact set exists (without verifying it).
    fn exists(&self) -> bool;
}
