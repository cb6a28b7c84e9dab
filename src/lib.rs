//! # loanrisk
//!
//! Loan default risk assessment backed by a logistic regression model.
//!
//! This crate provides:
//! - Offline training that produces a manifest-bound artifact set
//! - Inference preprocessing aligned to the training-time feature layout
//! - A fixed-threshold decision with a lender recommendation
//! - Terminal UI and JSON CLI front ends
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (records, catalog, layout, scaler, model, decision)
//! - `ports`: Trait definitions for artifact and dataset access
//! - `adapters`: Concrete implementations (JSON files, CSV)
//! - `application`: Use cases (preprocess, prediction, training)
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{ApplicantProfile, Decision, PredictionResponse, RawRecord, Recommendation};

/// Result type for loanrisk operations
pub type Result<T> = std::result::Result<T, LoanRiskError>;

/// Main error type for loanrisk
#[derive(Debug, thiserror::Error)]
pub enum LoanRiskError {
    #[error("Invalid input: {0}")]
    Input(#[from] domain::InputError),

    #[error("Model artifacts unavailable: {0}")]
    Artifact(#[from] domain::ArtifactError),

    #[error("Invalid training data: {0}")]
    Dataset(#[from] domain::DatasetError),

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Prediction failed: {0}")]
    Prediction(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LoanRiskError {
    /// Whether the user can fix the problem by correcting the request.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Input(_))
    }
}
