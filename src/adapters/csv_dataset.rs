//! CSV adapter: Implementation of DatasetSource.
//!
//! Expects a header row naming `LoanID`, `Default` and every model field.
//! Other columns are ignored.

use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;

use crate::domain::{
    Dataset, DatasetError, LabeledApplicant, RawRecord, CATEGORICAL_FIELDS, ID_COLUMN,
    NUMERIC_FIELDS, TARGET_COLUMN,
};
use crate::ports::DatasetSource;

/// Training dataset stored as a CSV file.
pub struct CsvDataset {
    path: PathBuf,
}

impl CsvDataset {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse a dataset from any reader.
    ///
    /// # Errors
    /// Returns `DatasetError` on a missing column or the first invalid value.
    pub fn from_reader<R: Read>(reader: R) -> Result<Dataset, DatasetError> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv
            .headers()
            .map_err(|e| DatasetError::Read(e.to_string()))?
            .clone();
        let index: HashMap<&str, usize> = headers.iter().enumerate().map(|(i, h)| (h, i)).collect();
        let column = |name: &str| {
            index
                .get(name)
                .copied()
                .ok_or_else(|| DatasetError::MissingColumn(name.to_string()))
        };

        let id_col = column(ID_COLUMN)?;
        let target_col = column(TARGET_COLUMN)?;
        let numeric_cols = NUMERIC_FIELDS
            .iter()
            .map(|f| column(f).map(|i| (*f, i)))
            .collect::<Result<Vec<_>, _>>()?;
        let categorical_cols = CATEGORICAL_FIELDS
            .iter()
            .map(|f| column(f).map(|i| (*f, i)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = Vec::new();
        for (n, result) in csv.records().enumerate() {
            let row = n + 1;
            let record = result.map_err(|e| DatasetError::Read(e.to_string()))?;
            let field = |i: usize| record.get(i).unwrap_or_default();
            let invalid = |column: &str, reason: String| DatasetError::InvalidValue {
                row,
                column: column.to_string(),
                reason,
            };

            let defaulted = match field(target_col) {
                "0" => 0,
                "1" => 1,
                other => {
                    return Err(invalid(
                        TARGET_COLUMN,
                        format!("expected 0 or 1, got {other:?}"),
                    ))
                }
            };

            let mut raw = RawRecord::new();
            for (name, i) in &numeric_cols {
                let value: f64 = field(*i)
                    .parse()
                    .map_err(|_| invalid(name, format!("not a number: {:?}", field(*i))))?;
                if !value.is_finite() {
                    return Err(invalid(name, "not finite".to_string()));
                }
                raw.insert(*name, value);
            }
            for (name, i) in &categorical_cols {
                let value = field(*i);
                if value.is_empty() {
                    return Err(invalid(name, "empty category".to_string()));
                }
                raw.insert(*name, value);
            }

            rows.push(LabeledApplicant {
                id: field(id_col).to_string(),
                record: raw,
                defaulted,
            });
        }

        Ok(Dataset::new(rows))
    }
}

impl DatasetSource for CsvDataset {
    fn load(&self) -> Result<Dataset, DatasetError> {
        let file = std::fs::File::open(&self.path)
            .map_err(|e| DatasetError::Read(format!("{}: {e}", self.path.display())))?;
        let dataset = Self::from_reader(std::io::BufReader::new(file))?;
        let [negatives, positives] = dataset.class_counts();
        tracing::info!(
            "Read {} rows from {:?} ({} defaults, {} repaid)",
            dataset.len(),
            self.path,
            positives,
            negatives
        );
        Ok(dataset)
    }
}
