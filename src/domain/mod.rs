//! Domain layer: Core business types and logic.
//!
//! Pure Rust types with no I/O. Artifacts, encoding and the decision rule
//! live here so training and inference share one definition.

mod applicant;
mod artifacts;
mod catalog;
mod classifier;
mod dataset;
mod decision;
mod layout;
mod scaler;

pub use applicant::{
    ApplicantProfile, InputError, RawRecord, RawValue, CATEGORICAL_FIELDS, LOAN_TERMS,
    NUMERIC_FIELDS,
};
pub use artifacts::{
    ArtifactError, ArtifactManifest, ArtifactSet, ARTIFACT_FILES, CATALOG_FILE,
    FEATURE_NAMES_FILE, MANIFEST_FILE, MANIFEST_VERSION, MODEL_FILE, SCALER_FILE,
};
pub use catalog::{indicator_column, CategoryCatalog};
pub use classifier::{sigmoid, FitOptions, FitSummary, LogisticModel};
pub use dataset::{Dataset, DatasetError, LabeledApplicant, ID_COLUMN, TARGET_COLUMN};
pub use decision::{decide, Decision, PredictionResponse, Recommendation, DECISION_THRESHOLD};
pub use layout::{Column, FeatureLayout, LayoutError};
pub use scaler::StandardScaler;

#[cfg(test)]
pub(crate) mod fixtures {
    pub(crate) use super::layout::tests::{loan_catalog, scenario_record};
}
