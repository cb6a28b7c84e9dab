//! Labeled training data.

use super::applicant::RawRecord;

/// Identifier column of the training dataset.
pub const ID_COLUMN: &str = "LoanID";

/// Binary target column: 1 if the applicant defaulted.
pub const TARGET_COLUMN: &str = "Default";

/// Errors in the training dataset. Any of these aborts training.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Dataset is missing column {0}")]
    MissingColumn(String),

    #[error("Row {row}: invalid {column}: {reason}")]
    InvalidValue {
        row: usize,
        column: String,
        reason: String,
    },

    #[error("Dataset has no rows")]
    Empty,

    #[error("Dataset contains a single class ({0}); both outcomes are required")]
    SingleClass(u8),

    #[error("Failed to read dataset: {0}")]
    Read(String),
}

/// One applicant with its observed outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledApplicant {
    pub id: String,
    pub record: RawRecord,
    pub defaulted: u8,
}

/// Rows of a training dataset, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub rows: Vec<LabeledApplicant>,
}

impl Dataset {
    #[must_use]
    pub fn new(rows: Vec<LabeledApplicant>) -> Self {
        Self { rows }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Count of rows per class: `[negatives, positives]`.
    #[must_use]
    pub fn class_counts(&self) -> [usize; 2] {
        let positives = self.rows.iter().filter(|r| r.defaulted == 1).count();
        [self.rows.len() - positives, positives]
    }

    /// Ensure the dataset can be trained on.
    ///
    /// # Errors
    /// Returns `DatasetError::Empty` or `DatasetError::SingleClass`.
    pub fn check(&self) -> Result<(), DatasetError> {
        match self.class_counts() {
            [0, 0] => Err(DatasetError::Empty),
            [0, _] => Err(DatasetError::SingleClass(1)),
            [_, 0] => Err(DatasetError::SingleClass(0)),
            _ => Ok(()),
        }
    }
}
