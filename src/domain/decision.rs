//! Decision types for loan default risk.
//!
//! Turns a default probability into a binary outcome and the recommendation
//! shown to the credit officer.

use serde::{Deserialize, Serialize};

use super::classifier::LogisticModel;

/// Probability cutoff chosen offline to balance precision and recall.
pub const DECISION_THRESHOLD: f64 = 0.6231;

/// Outcome of scoring one applicant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Estimated probability of default (0.0 to 1.0)
    pub probability: f64,

    /// `probability >= threshold`
    pub is_default: bool,
}

impl Decision {
    /// Classify a probability. The threshold itself counts as default.
    #[must_use]
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        Self {
            probability,
            is_default: probability >= threshold,
        }
    }

    #[must_use]
    pub fn recommendation(&self) -> Recommendation {
        if self.is_default {
            Recommendation::LikelyDefault
        } else {
            Recommendation::UnlikelyDefault
        }
    }
}

/// Score a scaled feature vector and classify it.
///
/// # Errors
/// Returns an error if the vector width differs from the model width.
pub fn decide(vector: &[f64], model: &LogisticModel, threshold: f64) -> Result<Decision, String> {
    let probability = model.predict_proba(vector)?;
    Ok(Decision::from_probability(probability, threshold))
}

/// Recommendation for the lender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    /// High risk: review before approval
    LikelyDefault,
    /// Low risk: standard procedure
    UnlikelyDefault,
}

impl Recommendation {
    /// Short description of the model decision.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::LikelyDefault => "Customer is likely to default (high risk)",
            Self::UnlikelyDefault => "Customer is unlikely to default (low risk)",
        }
    }

    /// Suggested actions for the bank.
    #[must_use]
    pub fn actions(&self) -> &'static [&'static str] {
        match self {
            Self::LikelyDefault => &[
                "The model estimates a high default probability for this customer.",
                "Further review by a senior credit analyst is recommended.",
                "Consider rejecting the application or offering stricter terms (higher rate, smaller amount, mandatory co-signer).",
            ],
            Self::UnlikelyDefault => &[
                "The model estimates a low default probability for this customer.",
                "The loan may be approved following standard bank procedures.",
                "Still perform standard data verification as per bank policy.",
            ],
        }
    }

    /// Associated color for TUI display (RGB).
    #[must_use]
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Self::LikelyDefault => (244, 63, 94),    // Rose (#F43F5E)
            Self::UnlikelyDefault => (16, 185, 129), // Emerald (#10B981)
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LikelyDefault => write!(f, "LIKELY TO DEFAULT"),
            Self::UnlikelyDefault => write!(f, "UNLIKELY TO DEFAULT"),
        }
    }
}

/// Response shape returned to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub probability: f64,
    pub is_default: bool,
}

impl From<Decision> for PredictionResponse {
    fn from(d: Decision) -> Self {
        Self {
            probability: d.probability,
            is_default: d.is_default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> LogisticModel {
        LogisticModel {
            coefficients: vec![0.8, -1.2, 0.3],
            intercept: 0.1,
        }
    }

    #[test]
    fn test_threshold_boundary_is_default() {
        let d = Decision::from_probability(DECISION_THRESHOLD, DECISION_THRESHOLD);
        assert!(d.is_default);
        assert_eq!(d.recommendation(), Recommendation::LikelyDefault);

        let below = Decision::from_probability(0.6230999, DECISION_THRESHOLD);
        assert!(!below.is_default);
    }

    #[test]
    fn test_decide_is_deterministic() {
        let v = [0.5, -0.25, 1.75];
        let a = decide(&v, &model(), DECISION_THRESHOLD).expect("decide");
        let b = decide(&v, &model(), DECISION_THRESHOLD).expect("decide");

        assert_eq!(a.probability.to_bits(), b.probability.to_bits());
        assert_eq!(a.is_default, b.is_default);
        assert!((0.0..=1.0).contains(&a.probability));
    }

    #[test]
    fn test_decide_rejects_wrong_width() {
        assert!(decide(&[1.0], &model(), DECISION_THRESHOLD).is_err());
    }

    #[test]
    fn test_response_shape() {
        let response = PredictionResponse::from(Decision::from_probability(0.9, 0.6231));
        let json = serde_json::to_value(response).expect("serialize");
        assert_eq!(json["is_default"], serde_json::Value::Bool(true));
        assert_eq!(json["probability"], serde_json::json!(0.9));
    }
}
