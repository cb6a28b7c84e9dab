//! Dataset source port: Trait for reading labeled training data.

use crate::domain::{Dataset, DatasetError};

/// Trait for training data sources.
pub trait DatasetSource {
    /// Read every row. Any malformed row fails the whole read.
    ///
    /// # Errors
    /// Returns `DatasetError` on missing columns or invalid values.
    fn load(&self) -> Result<Dataset, DatasetError>;
}
