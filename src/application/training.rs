//! Training service: Fits the artifact set from a labeled dataset.
//!
//! Pipeline:
//! 1. Derive the category catalog from the data
//! 2. Encode every row through the shared `FeatureLayout`
//! 3. Stratified train/test split (seeded ChaCha RNG)
//! 4. Fit the scaler on the train partition only
//! 5. Fit a class-balanced logistic regression
//! 6. Evaluate on the test partition at the decision threshold

use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::domain::{
    ArtifactError, ArtifactSet, CategoryCatalog, Dataset, DatasetError, Decision, FeatureLayout,
    FitOptions, FitSummary, LogisticModel, StandardScaler, CATEGORICAL_FIELDS, DECISION_THRESHOLD,
};
use crate::{LoanRiskError, Result};

/// Training options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingConfig {
    /// Fraction of each class held out for evaluation.
    pub test_size: f64,
    pub seed: u64,
    pub fit: FitOptions,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            fit: FitOptions::default(),
        }
    }
}

/// Test-partition metrics at the decision threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub threshold: f64,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// `None` when the test partition holds a single class.
    pub roc_auc: Option<f64>,
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub train_rows: usize,
    pub test_rows: usize,
    pub n_features: usize,
    pub fit: FitSummary,
    pub evaluation: Evaluation,
}

/// Artifacts ready to be saved, plus how they were obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOutcome {
    pub artifacts: ArtifactSet,
    pub report: TrainingReport,
}

/// Fit a complete artifact set.
///
/// # Errors
/// Returns `LoanRiskError::Dataset` for unusable data and
/// `LoanRiskError::Training` if the split or the solver fails.
pub fn train(dataset: &Dataset, config: &TrainingConfig) -> Result<TrainingOutcome> {
    dataset.check()?;
    if !(config.test_size > 0.0 && config.test_size < 1.0) {
        return Err(LoanRiskError::Training(format!(
            "test size must be in (0, 1), got {}",
            config.test_size
        )));
    }

    tracing::info!(
        "Training on {} rows (test_size={}, seed={}, C={})",
        dataset.len(),
        config.test_size,
        config.seed,
        config.fit.c
    );

    let catalog = derive_catalog(dataset)?;
    let layout = FeatureLayout::from_catalog(&catalog).map_err(ArtifactError::from)?;

    let mut x = Vec::with_capacity(dataset.len());
    for (i, row) in dataset.rows.iter().enumerate() {
        let encoded = layout
            .encode(&row.record)
            .map_err(|e| DatasetError::InvalidValue {
                row: i + 1,
                column: e.field().to_string(),
                reason: format!("{e} (LoanID {})", row.id),
            })?;
        x.push(encoded);
    }
    let y: Vec<u8> = dataset.rows.iter().map(|r| r.defaulted).collect();

    let (train_idx, test_idx) = stratified_split(&y, config.test_size, config.seed);
    if train_idx.is_empty() || test_idx.is_empty() {
        return Err(LoanRiskError::Training(
            "dataset too small to hold out a test partition".to_string(),
        ));
    }

    let x_train: Vec<Vec<f64>> = train_idx.iter().map(|&i| x[i].clone()).collect();
    let y_train: Vec<u8> = train_idx.iter().map(|&i| y[i]).collect();

    let scaler = StandardScaler::fit(&x_train).map_err(LoanRiskError::Training)?;
    let x_train_scaled = scale_rows(&scaler, &x_train)?;
    let test_scaled = scale_rows(
        &scaler,
        &test_idx.iter().map(|&i| x[i].clone()).collect::<Vec<_>>(),
    )?;
    let y_test: Vec<u8> = test_idx.iter().map(|&i| y[i]).collect();

    let design = to_matrix(&x_train_scaled, layout.len())?;
    let weights = Array1::from(balanced_weights(&y_train));
    let labels = Array1::from(y_train);
    let (model, fit) =
        LogisticModel::fit(design.view(), labels.view(), weights.view(), config.fit)
            .map_err(LoanRiskError::Training)?;
    if !fit.converged {
        tracing::warn!(
            "Solver stopped after {} iterations without converging",
            fit.iterations
        );
    }

    let evaluation = evaluate(&model, &test_scaled, &y_test, DECISION_THRESHOLD)?;
    tracing::info!(
        "Evaluation: accuracy={:.4}, precision={:.4}, recall={:.4}, f1={:.4}, roc_auc={:?}",
        evaluation.accuracy,
        evaluation.precision,
        evaluation.recall,
        evaluation.f1,
        evaluation.roc_auc
    );

    let report = TrainingReport {
        train_rows: train_idx.len(),
        test_rows: test_idx.len(),
        n_features: layout.len(),
        fit,
        evaluation,
    };
    let artifacts = ArtifactSet {
        model,
        scaler,
        feature_names: layout.feature_names().to_vec(),
        catalog,
    };

    Ok(TrainingOutcome { artifacts, report })
}

/// Sorted distinct values of every categorical field.
fn derive_catalog(dataset: &Dataset) -> Result<CategoryCatalog> {
    let mut catalog = CategoryCatalog::new();
    for field in CATEGORICAL_FIELDS {
        let mut values = Vec::with_capacity(dataset.len());
        for (i, row) in dataset.rows.iter().enumerate() {
            let value = row
                .record
                .category(field)
                .map_err(|e| DatasetError::InvalidValue {
                    row: i + 1,
                    column: field.to_string(),
                    reason: e.to_string(),
                })?;
            values.push(value);
        }
        catalog.observe(field, values);
    }
    Ok(catalog)
}

fn scale_rows(scaler: &StandardScaler, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
    rows.iter()
        .map(|r| scaler.transform(r).map_err(LoanRiskError::Training))
        .collect()
}

fn to_matrix(rows: &[Vec<f64>], width: usize) -> Result<Array2<f64>> {
    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), width), flat)
        .map_err(|e| LoanRiskError::Training(format!("design matrix: {e}")))
}

/// Split row indices into `(train, test)`, holding out `test_size` of each
/// class. Both partitions are returned in ascending index order.
pub fn stratified_split(labels: &[u8], test_size: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for class in [0_u8, 1] {
        let mut members: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == class)
            .map(|(i, _)| i)
            .collect();
        if members.is_empty() {
            continue;
        }
        members.shuffle(&mut rng);

        let held_out = ((members.len() as f64 * test_size).round() as usize).min(members.len() - 1);
        test.extend_from_slice(&members[..held_out]);
        train.extend_from_slice(&members[held_out..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

/// `n_samples / (2 * count(class))` per row.
pub fn balanced_weights(labels: &[u8]) -> Vec<f64> {
    let n = labels.len() as f64;
    let positives = labels.iter().filter(|l| **l == 1).count();
    let counts = [labels.len() - positives, positives];
    labels
        .iter()
        .map(|l| n / (2.0 * counts[usize::from(*l)] as f64))
        .collect()
}

/// Score the held-out rows.
///
/// # Errors
/// Returns `LoanRiskError::Prediction` if a row does not fit the model.
pub fn evaluate(
    model: &LogisticModel,
    x: &[Vec<f64>],
    y: &[u8],
    threshold: f64,
) -> Result<Evaluation> {
    let mut scores = Vec::with_capacity(x.len());
    let (mut tp, mut fp, mut tn, mut fn_) = (0, 0, 0, 0);
    for (row, label) in x.iter().zip(y) {
        let p = model.predict_proba(row).map_err(LoanRiskError::Prediction)?;
        scores.push(p);
        match (Decision::from_probability(p, threshold).is_default, *label == 1) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, false) => tn += 1,
            (false, true) => fn_ += 1,
        }
    }

    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    Ok(Evaluation {
        threshold,
        accuracy: ratio(tp + tn, x.len()),
        precision,
        recall,
        f1,
        roc_auc: roc_auc(&scores, y),
        true_positives: tp,
        false_positives: fp,
        true_negatives: tn,
        false_negatives: fn_,
    })
}

/// Area under the ROC curve via the rank-sum statistic, ties averaged.
pub fn roc_auc(scores: &[f64], labels: &[u8]) -> Option<f64> {
    let positives = labels.iter().filter(|l| **l == 1).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|a, b| scores[*a].total_cmp(&scores[*b]));

    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && scores[order[end + 1]] == scores[order[start]] {
            end += 1;
        }
        // Ranks are 1-based; tied scores share the mean rank.
        let rank = (start + end) as f64 / 2.0 + 1.0;
        positive_rank_sum += rank
            * order[start..=end]
                .iter()
                .filter(|i| labels[**i] == 1)
                .count() as f64;
        start = end + 1;
    }

    let p = positives as f64;
    let n = negatives as f64;
    Some((positive_rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}
