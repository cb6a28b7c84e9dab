//! Prediction service: Scores applicants against loaded artifacts.
//!
//! The model context is built once from a validated artifact set and never
//! mutated, so it is shared behind an `Arc` without locks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::preprocess::preprocess_with_layout;
use crate::domain::{
    decide, ApplicantProfile, ArtifactError, ArtifactSet, CategoryCatalog, Decision,
    FeatureLayout, LogisticModel, PredictionResponse, RawRecord, Recommendation, StandardScaler,
    DECISION_THRESHOLD,
};
use crate::ports::ArtifactStore;
use crate::{LoanRiskError, Result};

/// Everything needed to score a request.
#[derive(Debug)]
pub struct ModelContext {
    model: LogisticModel,
    scaler: StandardScaler,
    layout: FeatureLayout,
    threshold: f64,
}

impl ModelContext {
    /// Build a context from an artifact set, validating it first.
    ///
    /// # Errors
    /// Returns `ArtifactError` if the artifacts do not belong together.
    pub fn new(artifacts: ArtifactSet) -> std::result::Result<Self, ArtifactError> {
        let layout = artifacts.validate()?;
        Ok(Self {
            model: artifacts.model,
            scaler: artifacts.scaler,
            layout,
            threshold: DECISION_THRESHOLD,
        })
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        self.layout.feature_names()
    }

    #[must_use]
    pub fn catalog(&self) -> &CategoryCatalog {
        self.layout.catalog()
    }

    /// Scaled feature vector for `raw`.
    ///
    /// # Errors
    /// Returns `LoanRiskError::Input` for a bad record.
    pub fn preprocess(&self, raw: &RawRecord) -> Result<Vec<f64>> {
        preprocess_with_layout(raw, &self.layout, &self.scaler)
    }

    /// Preprocess and classify.
    ///
    /// # Errors
    /// Returns `LoanRiskError::Input` for a bad record.
    pub fn decide(&self, raw: &RawRecord) -> Result<Decision> {
        let vector = self.preprocess(raw)?;
        decide(&vector, &self.model, self.threshold).map_err(LoanRiskError::Prediction)
    }
}

/// One scored application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub id: String,
    pub probability: f64,
    pub is_default: bool,
    pub recommendation: Recommendation,
    pub threshold: f64,
    pub created_at: DateTime<Utc>,
}

impl Assessment {
    #[must_use]
    pub fn response(&self) -> PredictionResponse {
        PredictionResponse {
            probability: self.probability,
            is_default: self.is_default,
        }
    }
}

/// Service for scoring loan applications.
#[derive(Debug, Clone)]
pub struct PredictionService {
    context: Arc<ModelContext>,
}

impl PredictionService {
    /// Create a new prediction service.
    #[must_use]
    pub fn new(context: Arc<ModelContext>) -> Self {
        Self { context }
    }

    /// Load artifacts from `store` and build the service.
    ///
    /// # Errors
    /// Returns `ArtifactError` if loading or validation fails.
    pub fn from_store(store: &dyn ArtifactStore) -> std::result::Result<Self, ArtifactError> {
        let context = ModelContext::new(store.load()?)?;
        tracing::info!(
            "Prediction service ready (n_features={}, threshold={})",
            context.feature_names().len(),
            context.threshold()
        );
        Ok(Self::new(Arc::new(context)))
    }

    #[must_use]
    pub fn context(&self) -> &ModelContext {
        &self.context
    }

    /// `{probability, is_default}` for a raw record.
    ///
    /// # Errors
    /// Returns `LoanRiskError::Input` for a bad record.
    pub fn predict(&self, raw: &RawRecord) -> Result<PredictionResponse> {
        self.context.decide(raw).map(PredictionResponse::from)
    }

    /// Score a raw record and stamp the result.
    ///
    /// # Errors
    /// Returns `LoanRiskError::Input` for a bad record.
    pub fn assess(&self, raw: &RawRecord) -> Result<Assessment> {
        let decision = match self.context.decide(raw) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!("Assessment rejected: {}", e);
                return Err(e);
            }
        };

        let assessment = Assessment {
            id: uuid_v4(),
            probability: decision.probability,
            is_default: decision.is_default,
            recommendation: decision.recommendation(),
            threshold: self.context.threshold(),
            created_at: Utc::now(),
        };

        tracing::info!(
            "Assessment {}: probability={:.4}, default={}",
            assessment.id,
            assessment.probability,
            assessment.is_default
        );
        Ok(assessment)
    }

    /// Score a typed form submission.
    ///
    /// # Errors
    /// Returns `LoanRiskError::Input` for a bad record.
    pub fn assess_profile(&self, profile: &ApplicantProfile) -> Result<Assessment> {
        self.assess(&profile.to_raw_record())
    }
}

/// Random (version 4) UUID string.
fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::FsArtifactStore;
    use crate::application::training::{tests::synthetic_dataset, train, TrainingConfig};
    use crate::domain::fixtures::scenario_record;
    use crate::domain::InputError;

    fn trained_service() -> PredictionService {
        let outcome = train(&synthetic_dataset(400, 5), &TrainingConfig::default()).expect("train");
        PredictionService::new(Arc::new(
            ModelContext::new(outcome.artifacts).expect("context"),
        ))
    }

    #[test]
    fn test_scenario_end_to_end() {
        let service = trained_service();
        let assessment = service.assess(&scenario_record()).expect("assess");

        assert!((0.0..=1.0).contains(&assessment.probability));
        assert_eq!(
            assessment.is_default,
            assessment.probability >= DECISION_THRESHOLD
        );
        assert_eq!(assessment.threshold, DECISION_THRESHOLD);
        assert_eq!(
            assessment.recommendation,
            if assessment.is_default {
                Recommendation::LikelyDefault
            } else {
                Recommendation::UnlikelyDefault
            }
        );
    }

    #[test]
    fn test_predict_is_deterministic() {
        let service = trained_service();
        let a = service.predict(&scenario_record()).expect("first");
        let b = service.predict(&scenario_record()).expect("second");
        assert_eq!(a.probability.to_bits(), b.probability.to_bits());
        assert_eq!(a.is_default, b.is_default);
    }

    #[test]
    fn test_assessment_ids_are_unique_v4() {
        let service = trained_service();
        let a = service.assess(&scenario_record()).expect("assess");
        let b = service.assess(&scenario_record()).expect("assess");

        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 36);
        assert_eq!(a.id.as_bytes()[14], b'4');
    }

    #[test]
    fn test_bad_input_is_recoverable() {
        let service = trained_service();
        let err = service
            .assess(&scenario_record().with("EmploymentType", "Retired"))
            .expect_err("unknown category");
        assert!(err.is_recoverable());
        assert!(matches!(
            err,
            LoanRiskError::Input(InputError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_from_store() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = FsArtifactStore::new(temp.path().join("models"));
        assert!(matches!(
            PredictionService::from_store(&store),
            Err(ArtifactError::Missing(_))
        ));

        let outcome = train(&synthetic_dataset(200, 9), &TrainingConfig::default()).expect("train");
        store.save(&outcome.artifacts).expect("save");

        let service = PredictionService::from_store(&store).expect("service");
        assert_eq!(service.context().feature_names().len(), 24);
        assert!(service.predict(&scenario_record()).is_ok());
    }
}
