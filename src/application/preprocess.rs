//! Inference preprocessing: raw record to scaled feature vector.
//!
//! Shares `FeatureLayout` with training, so the encoding cannot drift
//! between the two.

use crate::domain::{ArtifactError, CategoryCatalog, FeatureLayout, RawRecord, StandardScaler};
use crate::{LoanRiskError, Result};

/// Turn a raw record into the scaled vector the classifier expects.
///
/// The output follows `feature_names` exactly. Resolving the layout on every
/// call is wasteful for repeated requests; `ModelContext` resolves it once
/// and calls [`preprocess_with_layout`].
///
/// # Errors
/// Returns `LoanRiskError::Input` for a bad record and
/// `LoanRiskError::Artifact` if the artifacts disagree with each other.
pub fn preprocess(
    raw: &RawRecord,
    feature_names: &[String],
    catalog: &CategoryCatalog,
    scaler: &StandardScaler,
) -> Result<Vec<f64>> {
    let layout = FeatureLayout::resolve(feature_names, catalog).map_err(ArtifactError::from)?;
    preprocess_with_layout(raw, &layout, scaler)
}

/// Encode with an already resolved layout, then standardize every column.
///
/// # Errors
/// Same as [`preprocess`].
pub fn preprocess_with_layout(
    raw: &RawRecord,
    layout: &FeatureLayout,
    scaler: &StandardScaler,
) -> Result<Vec<f64>> {
    if scaler.width() != layout.len() {
        return Err(ArtifactError::Inconsistent(format!(
            "scaler has {} columns but the layout has {}",
            scaler.width(),
            layout.len()
        ))
        .into());
    }

    let encoded = layout.encode(raw)?;
    scaler.transform(&encoded).map_err(LoanRiskError::Prediction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{loan_catalog, scenario_record};
    use crate::domain::{InputError, RawValue};

    fn fixture() -> (Vec<String>, CategoryCatalog, StandardScaler) {
        let catalog = loan_catalog();
        let names = FeatureLayout::from_catalog(&catalog)
            .expect("layout")
            .feature_names()
            .to_vec();
        let n = names.len();
        let scaler = StandardScaler {
            mean: (0..n).map(|i| i as f64 * 0.1).collect(),
            var: vec![4.0; n],
            scale: vec![2.0; n],
        };
        (names, catalog, scaler)
    }

    #[test]
    fn test_output_follows_feature_names() {
        let (names, catalog, scaler) = fixture();
        let out = preprocess(&scenario_record(), &names, &catalog, &scaler).expect("preprocess");

        assert_eq!(out.len(), names.len());
        // Age = 30, mean 0.0, scale 2.0
        assert_eq!(out[0], 15.0);
        let high_school = names
            .iter()
            .position(|n| n == "Education_High School")
            .expect("column");
        assert_eq!(out[high_school], (1.0 - high_school as f64 * 0.1) / 2.0);
    }

    #[test]
    fn test_reference_categories_scale_from_zero() {
        let (names, catalog, scaler) = fixture();
        let record = scenario_record()
            .with("Education", "Bachelor's")
            .with("MaritalStatus", "Divorced")
            .with("LoanPurpose", "Auto");
        let out = preprocess(&record, &names, &catalog, &scaler).expect("preprocess");

        for (i, value) in out.iter().enumerate().skip(9) {
            assert_eq!(*value, (0.0 - scaler.mean[i]) / scaler.scale[i]);
        }
    }

    #[test]
    fn test_input_errors() {
        let (names, catalog, scaler) = fixture();

        let unknown = scenario_record().with("LoanPurpose", "Vacation");
        assert!(matches!(
            preprocess(&unknown, &names, &catalog, &scaler),
            Err(LoanRiskError::Input(InputError::UnknownCategory { .. }))
        ));

        let mut missing = scenario_record();
        missing.remove("Income");
        assert!(matches!(
            preprocess(&missing, &names, &catalog, &scaler),
            Err(LoanRiskError::Input(InputError::MissingField(_)))
        ));

        let text = scenario_record().with("CreditScore", RawValue::Text("700".into()));
        let err = preprocess(&text, &names, &catalog, &scaler).expect_err("text");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_idempotent() {
        let (names, catalog, scaler) = fixture();
        let record = scenario_record();
        let a = preprocess(&record, &names, &catalog, &scaler).expect("first");
        let b = preprocess(&record, &names, &catalog, &scaler).expect("second");

        let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn test_scaler_width_mismatch_is_artifact_error() {
        let (names, catalog, mut scaler) = fixture();
        scaler.mean.pop();
        scaler.var.pop();
        scaler.scale.pop();
        let err = preprocess(&scenario_record(), &names, &catalog, &scaler).expect_err("width");
        assert!(matches!(err, LoanRiskError::Artifact(_)));
        assert!(!err.is_recoverable());
    }
}
