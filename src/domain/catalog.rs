//! Category catalog: the allowed values of every categorical field.
//!
//! The catalog is fixed at training time. The first category of each field is
//! its reference level and is encoded as all-zero indicators.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::applicant::{InputError, CATEGORICAL_FIELDS};

/// Categorical field name to its ordered list of categories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryCatalog(BTreeMap<String, Vec<String>>);

impl CategoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the categories of `field` from observed values: distinct
    /// values, sorted lexicographically.
    pub fn observe<'a, I>(&mut self, field: &str, values: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let distinct: BTreeSet<&str> = values.into_iter().collect();
        self.insert(field, distinct.into_iter().map(str::to_string).collect());
    }

    pub fn insert(&mut self, field: impl Into<String>, categories: Vec<String>) {
        self.0.insert(field.into(), categories);
    }

    #[must_use]
    pub fn categories(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// The reference (dropped) category of a field.
    #[must_use]
    pub fn reference(&self, field: &str) -> Option<&str> {
        self.categories(field)
            .and_then(|c| c.first())
            .map(String::as_str)
    }

    #[must_use]
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Position of `value` within the field's categories.
    ///
    /// # Errors
    /// Returns `InputError::UnknownCategory` if the field is not cataloged or
    /// the value is not one of its categories.
    pub fn position(&self, field: &str, value: &str) -> Result<usize, InputError> {
        let categories = self.categories(field).unwrap_or(&[]);
        categories
            .iter()
            .position(|c| c == value)
            .ok_or_else(|| InputError::UnknownCategory {
                field: field.to_string(),
                value: value.to_string(),
                allowed: categories.to_vec(),
            })
    }

    /// Structural checks: every categorical field is present with a non-empty,
    /// duplicate-free category list.
    ///
    /// # Errors
    /// Returns a description of every problem found.
    pub fn check(&self) -> Result<(), Vec<String>> {
        let mut problems = Vec::new();
        for field in CATEGORICAL_FIELDS {
            match self.categories(field) {
                None => problems.push(format!("catalog is missing field {field}")),
                Some([]) => problems.push(format!("catalog field {field} has no categories")),
                Some(categories) => {
                    let distinct: BTreeSet<&String> = categories.iter().collect();
                    if distinct.len() != categories.len() {
                        problems.push(format!("catalog field {field} has duplicate categories"));
                    }
                }
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

/// Column name of the indicator for `category` of `field`.
#[must_use]
pub fn indicator_column(field: &str, category: &str) -> String {
    format!("{field}_{category}")
}
