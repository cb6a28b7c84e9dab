//! Logistic regression over the standardized feature vector.

use linfa::traits::Fit;
use linfa::Dataset;
use linfa_logistic::LogisticRegression;
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Fitted linear model: `p = sigmoid(intercept + coefficients · x)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

/// Solver settings for [`LogisticModel::fit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Inverse L2 regularization strength. The intercept is not penalized.
    pub c: f64,
    pub max_iter: usize,
    /// Stop when the largest component of the normalized gradient falls
    /// below this.
    pub tol: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-6,
        }
    }
}

/// Outcome of a fit, for logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitSummary {
    pub iterations: usize,
    pub converged: bool,
    pub objective: f64,
}

/// Numerically stable logistic function.
#[must_use]
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^t)` without overflow.
fn softplus(t: f64) -> f64 {
    t.max(0.0) + (-t.abs()).exp().ln_1p()
}

impl LogisticModel {
    #[must_use]
    pub fn width(&self) -> usize {
        self.coefficients.len()
    }

    fn linear(&self, x: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(x)
                .map(|(w, v)| w * v)
                .sum::<f64>()
    }

    /// Probability of the positive ("default") class.
    ///
    /// # Errors
    /// Returns an error if the vector width differs from the model width.
    pub fn predict_proba(&self, x: &[f64]) -> Result<f64, String> {
        if x.len() != self.width() {
            return Err(format!(
                "Feature count mismatch: got {}, expected {}",
                x.len(),
                self.width()
            ));
        }
        Ok(sigmoid(self.linear(x)))
    }

    /// Internal consistency of the persisted parameters.
    ///
    /// # Errors
    /// Returns a description of the problem found.
    pub fn check(&self) -> Result<(), String> {
        if self.coefficients.is_empty() {
            return Err("model has no coefficients".to_string());
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|w| !w.is_finite()) {
            return Err("model contains non-finite parameters".to_string());
        }
        Ok(())
    }

    /// Fit a sample-weighted, L2-regularized logistic regression.
    ///
    /// Minimizes `0.5 * |w|^2 + C * sum_i s_i * logloss_i`. `linfa-logistic`
    /// solves the unweighted problem (L-BFGS). It takes no sample weights, so
    /// its solution only seeds a backtracking gradient descent on the
    /// weighted objective.
    ///
    /// # Errors
    /// Returns an error on empty or mismatched inputs or a single class.
    pub fn fit(
        x: ArrayView2<f64>,
        y: ArrayView1<u8>,
        sample_weight: ArrayView1<f64>,
        options: FitOptions,
    ) -> Result<(Self, FitSummary), String> {
        let (n, d) = x.dim();
        if n == 0 || d == 0 {
            return Err("cannot fit on an empty matrix".to_string());
        }
        if y.len() != n || sample_weight.len() != n {
            return Err("x, y and sample_weight lengths differ".to_string());
        }
        if !(options.c > 0.0) {
            return Err("C must be positive".to_string());
        }
        if sample_weight.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
            return Err("sample weights must be positive".to_string());
        }
        if !(y.iter().any(|l| *l == 1) && y.iter().any(|l| *l == 0)) {
            return Err("both classes are required".to_string());
        }

        let start = Self::fit_unweighted(x, y, options).unwrap_or_else(|e| {
            tracing::warn!("{e}; refining from zero");
            Self {
                coefficients: vec![0.0; d],
                intercept: 0.0,
            }
        });
        Ok(start.refine(x, y, sample_weight, options))
    }

    fn fit_unweighted(
        x: ArrayView2<f64>,
        y: ArrayView1<u8>,
        options: FitOptions,
    ) -> Result<Self, String> {
        let dataset = Dataset::new(x.to_owned(), y.to_owned());
        let fitted = LogisticRegression::default()
            .alpha(1.0 / options.c)
            .with_intercept(true)
            .max_iterations(options.max_iter as u64)
            .fit(&dataset)
            .map_err(|e| format!("logistic regression failed: {e}"))?;

        let mut model = Self {
            coefficients: fitted.params().to_vec(),
            intercept: fitted.intercept(),
        };
        // linfa reports the probability of its `pos` label.
        if fitted.labels().pos.class != 1 {
            model.coefficients.iter_mut().for_each(|w| *w = -*w);
            model.intercept = -model.intercept;
        }
        Ok(model)
    }

    /// Gradient descent on the weighted objective, normalized by
    /// `C * sum(s)` so the tolerance does not depend on the row count.
    fn refine(
        self,
        x: ArrayView2<f64>,
        y: ArrayView1<u8>,
        sample_weight: ArrayView1<f64>,
        options: FitOptions,
    ) -> (Self, FitSummary) {
        let objective = WeightedObjective {
            x,
            y: y.mapv(f64::from),
            s: sample_weight.mapv(|s| s * options.c),
            norm: options.c * sample_weight.sum(),
        };

        let mut w = Array1::from(self.coefficients);
        let mut b = self.intercept;
        let (mut value, mut grad_w, mut grad_b) = objective.evaluate(&w, b);
        let mut step = 1.0;
        let mut summary = FitSummary {
            iterations: 0,
            converged: false,
            objective: value,
        };

        for iter in 1..=options.max_iter {
            let grad_max = grad_w.fold(grad_b.abs(), |acc, g| acc.max(g.abs()));
            if grad_max < options.tol {
                summary.converged = true;
                break;
            }

            let grad_sq = grad_w.dot(&grad_w) + grad_b * grad_b;
            let (candidate_w, candidate_b, candidate) = loop {
                let cw = &w - &(&grad_w * step);
                let cb = b - step * grad_b;
                let next = objective.evaluate(&cw, cb);
                // Armijo condition.
                if next.0 <= value - 0.5 * step * grad_sq || step < 1e-12 {
                    break (cw, cb, next);
                }
                step *= 0.5;
            };
            if candidate.0 > value {
                break;
            }

            w = candidate_w;
            b = candidate_b;
            (value, grad_w, grad_b) = candidate;
            summary.iterations = iter;
            summary.objective = value;
            step *= 2.0;
        }

        let model = Self {
            coefficients: w.to_vec(),
            intercept: b,
        };
        (model, summary)
    }
}

/// Normalized weighted loss over a borrowed design matrix.
struct WeightedObjective<'a> {
    x: ArrayView2<'a, f64>,
    y: Array1<f64>,
    /// `C * s_i`.
    s: Array1<f64>,
    norm: f64,
}

impl WeightedObjective<'_> {
    /// Value and gradient with respect to `(w, b)`.
    fn evaluate(&self, w: &Array1<f64>, b: f64) -> (f64, Array1<f64>, f64) {
        let z = self.x.dot(w) + b;

        let mut loss = 0.0;
        let mut residual = Array1::zeros(z.len());
        for (((r, z), y), s) in residual
            .iter_mut()
            .zip(&z)
            .zip(&self.y)
            .zip(&self.s)
        {
            loss += s * if *y > 0.5 { softplus(-z) } else { softplus(*z) };
            *r = s * (sigmoid(*z) - y);
        }

        let value = (0.5 * w.dot(w) + loss) / self.norm;
        let grad_w = (self.x.t().dot(&residual) + w) / self.norm;
        let grad_b = residual.sum() / self.norm;
        (value, grad_w, grad_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn test_sigmoid_is_stable_and_symmetric() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_predict_proba_checks_width() {
        let model = LogisticModel {
            coefficients: vec![1.0, -1.0],
            intercept: 0.0,
        };
        assert_eq!(model.predict_proba(&[2.0, 2.0]), Ok(0.5));
        assert!(model.predict_proba(&[1.0]).is_err());
    }

    #[test]
    fn test_fit_learns_direction() {
        let x = Array2::from_shape_fn((40, 1), |(i, _)| i as f64 / 10.0 - 2.0);
        let y = Array1::from_shape_fn(40, |i| u8::from(i % 7 != 0 && i >= 20 || i % 9 == 0));
        let weights = Array1::ones(40);

        let (model, summary) =
            LogisticModel::fit(x.view(), y.view(), weights.view(), FitOptions::default())
                .expect("fit");

        assert!(summary.converged);
        assert!(model.coefficients[0] > 0.0);
        let low = model.predict_proba(&[-2.0]).expect("proba");
        let high = model.predict_proba(&[2.0]).expect("proba");
        assert!(low < 0.5 && high > 0.5);
    }

    #[test]
    fn test_sample_weights_shift_intercept() {
        let x = Array2::zeros((4, 1));
        let y = array![1_u8, 0, 0, 0];
        let options = FitOptions::default();

        let (plain, _) =
            LogisticModel::fit(x.view(), y.view(), Array1::ones(4).view(), options).expect("fit");
        let balanced_weights = array![2.0, 2.0 / 3.0, 2.0 / 3.0, 2.0 / 3.0];
        let (balanced, summary) =
            LogisticModel::fit(x.view(), y.view(), balanced_weights.view(), options)
                .expect("fit");

        assert!(summary.converged);
        assert!((plain.predict_proba(&[0.0]).expect("p") - 0.25).abs() < 1e-5);
        assert!((balanced.predict_proba(&[0.0]).expect("p") - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_upweighted_class_gains_probability() {
        // Imbalanced 1-D data: one positive in five.
        let x = Array2::from_shape_fn((50, 1), |(i, _)| (i % 10) as f64 / 5.0 - 1.0);
        let y = Array1::from_shape_fn(50, |i| u8::from(i % 5 == 0 || i % 10 == 9));
        let positives = y.iter().filter(|l| **l == 1).count() as f64;
        let balanced = y.mapv(|l| {
            if l == 1 {
                50.0 / (2.0 * positives)
            } else {
                50.0 / (2.0 * (50.0 - positives))
            }
        });
        let options = FitOptions::default();

        let (plain, _) =
            LogisticModel::fit(x.view(), y.view(), Array1::ones(50).view(), options).expect("fit");
        let (weighted, _) =
            LogisticModel::fit(x.view(), y.view(), balanced.view(), options).expect("fit");

        let at_zero = |m: &LogisticModel| m.predict_proba(&[0.0]).expect("p");
        assert!(at_zero(&weighted) > at_zero(&plain));
        assert!(weighted.check().is_ok());
    }

    #[test]
    fn test_fit_rejects_bad_inputs() {
        let options = FitOptions::default();
        let empty = Array2::<f64>::zeros((0, 1));
        let none = Array1::<u8>::zeros(0);
        assert!(LogisticModel::fit(empty.view(), none.view(), Array1::zeros(0).view(), options)
            .is_err());

        let x = Array2::ones((2, 1));
        let labels = array![1_u8, 0];
        assert!(
            LogisticModel::fit(x.view(), labels.view(), array![1.0].view(), options).is_err()
        );
        assert!(LogisticModel::fit(
            x.view(),
            array![1_u8, 1].view(),
            Array1::ones(2).view(),
            options
        )
        .is_err());
    }
}
