//! Feature standardization fitted at training time.

use serde::{Deserialize, Serialize};

/// Per-column standardization: `(x - mean) / scale`.
///
/// Applied to the whole encoded row, indicator columns included, because the
/// model was fitted on rows standardized that way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub var: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit on row-major data using population variance. Constant columns get
    /// a scale of 1.0 so they transform to zero instead of NaN.
    ///
    /// # Errors
    /// Returns an error if `rows` is empty or ragged.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, String> {
        let Some(first) = rows.first() else {
            return Err("cannot fit a scaler on zero rows".to_string());
        };
        let width = first.len();
        if rows.iter().any(|r| r.len() != width) {
            return Err("rows have inconsistent widths".to_string());
        }

        let n = rows.len() as f64;
        let mut mean = vec![0.0; width];
        for row in rows {
            for (m, x) in mean.iter_mut().zip(row) {
                *m += x;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut var = vec![0.0; width];
        for row in rows {
            for ((v, x), m) in var.iter_mut().zip(row).zip(&mean) {
                *v += (x - m) * (x - m);
            }
        }
        for v in &mut var {
            *v /= n;
        }

        let scale = var
            .iter()
            .map(|v| if *v > 0.0 { v.sqrt() } else { 1.0 })
            .collect();

        Ok(Self { mean, var, scale })
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.mean.len()
    }

    /// Standardize one row.
    ///
    /// # Errors
    /// Returns an error if the row width differs from the fitted width.
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, String> {
        if row.len() != self.width() {
            return Err(format!(
                "Feature count mismatch: got {}, expected {}",
                row.len(),
                self.width()
            ));
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }

    /// Internal consistency of the persisted parameters.
    ///
    /// # Errors
    /// Returns a description of the first problem found.
    pub fn check(&self) -> Result<(), String> {
        if self.var.len() != self.mean.len() || self.scale.len() != self.mean.len() {
            return Err("scaler mean, var and scale lengths differ".to_string());
        }
        if self
            .scale
            .iter()
            .chain(&self.mean)
            .any(|v| !v.is_finite())
        {
            return Err("scaler contains non-finite values".to_string());
        }
        if self.scale.iter().any(|s| *s <= 0.0) {
            return Err("scaler scale must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_uses_population_variance() {
        let rows = vec![vec![1.0, 5.0], vec![3.0, 5.0]];
        let scaler = StandardScaler::fit(&rows).expect("fit");

        assert_eq!(scaler.mean, vec![2.0, 5.0]);
        assert_eq!(scaler.var, vec![1.0, 0.0]);
        assert_eq!(scaler.scale, vec![1.0, 1.0]);
    }

    #[test]
    fn test_transform_standardizes() {
        let rows = vec![vec![0.0, 10.0], vec![4.0, 20.0], vec![8.0, 30.0]];
        let scaler = StandardScaler::fit(&rows).expect("fit");
        let out = scaler.transform(&[4.0, 30.0]).expect("transform");

        assert!(out[0].abs() < 1e-12);
        assert!((out[1] - 10.0 / (200.0_f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_transform_rejects_wrong_width() {
        let scaler = StandardScaler::fit(&[vec![1.0, 2.0]]).expect("fit");
        assert!(scaler.transform(&[1.0]).is_err());
    }

    #[test]
    fn test_fit_rejects_empty_and_ragged() {
        assert!(StandardScaler::fit(&[]).is_err());
        assert!(StandardScaler::fit(&[vec![1.0], vec![1.0, 2.0]]).is_err());
    }

    #[test]
    fn test_check_rejects_zero_scale() {
        let scaler = StandardScaler {
            mean: vec![0.0],
            var: vec![0.0],
            scale: vec![0.0],
        };
        assert!(scaler.check().is_err());
    }
}
