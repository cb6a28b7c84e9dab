//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod prediction;
mod preprocess;
pub(crate) mod training;

pub use prediction::{Assessment, ModelContext, PredictionService};
pub use preprocess::{preprocess, preprocess_with_layout};
pub use training::{
    balanced_weights, evaluate, roc_auc, stratified_split, train, Evaluation, TrainingConfig,
    TrainingOutcome, TrainingReport,
};
