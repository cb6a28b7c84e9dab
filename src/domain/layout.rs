//! Feature layout: the contract between training and inference.
//!
//! The ordered feature-name list is resolved once against the category
//! catalog into typed columns. Encoding a record then walks the columns in
//! order, so the output always has exactly the training-time width and order.

use std::collections::HashSet;

use super::applicant::{InputError, RawRecord, CATEGORICAL_FIELDS, NUMERIC_FIELDS};
use super::catalog::{indicator_column, CategoryCatalog};

/// One resolved feature column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    /// Raw value of a numeric field.
    Numeric { field: &'static str },
    /// 1.0 if `field == categories[category]`, else 0.0.
    Indicator {
        field: &'static str,
        category: usize,
    },
}

/// Error raised when a feature-name list does not agree with the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Feature layout mismatch: {}", .problems.join("; "))]
pub struct LayoutError {
    pub problems: Vec<String>,
}

/// Typed, validated view of the training-time feature ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureLayout {
    columns: Vec<Column>,
    names: Vec<String>,
    catalog: CategoryCatalog,
}

impl FeatureLayout {
    /// Derive the training layout from a catalog: numeric fields first, then
    /// one indicator per non-reference category, field by field.
    ///
    /// # Errors
    /// Returns `LayoutError` if the catalog is incomplete.
    pub fn from_catalog(catalog: &CategoryCatalog) -> Result<Self, LayoutError> {
        catalog
            .check()
            .map_err(|problems| LayoutError { problems })?;

        let mut names: Vec<String> = NUMERIC_FIELDS.iter().map(|f| (*f).to_string()).collect();
        for field in CATEGORICAL_FIELDS {
            for category in catalog.categories(field).unwrap_or(&[]).iter().skip(1) {
                names.push(indicator_column(field, category));
            }
        }
        Self::resolve(&names, catalog)
    }

    /// Resolve a persisted feature-name list against the catalog.
    ///
    /// Every name must be a numeric field or the indicator of a non-reference
    /// category; names must be unique and every numeric field must appear.
    ///
    /// # Errors
    /// Returns `LayoutError` listing every problem found.
    pub fn resolve(feature_names: &[String], catalog: &CategoryCatalog) -> Result<Self, LayoutError> {
        let mut problems = catalog.check().err().unwrap_or_default();

        if feature_names.is_empty() {
            problems.push("feature name list is empty".to_string());
        }

        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(feature_names.len());
        for name in feature_names {
            if !seen.insert(name.as_str()) {
                problems.push(format!("duplicate feature name {name}"));
                continue;
            }
            match Self::resolve_name(name, catalog) {
                Ok(column) => columns.push(column),
                Err(problem) => problems.push(problem),
            }
        }

        for field in NUMERIC_FIELDS {
            if !seen.contains(field) {
                problems.push(format!("numeric field {field} is not a model feature"));
            }
        }

        if !problems.is_empty() {
            return Err(LayoutError { problems });
        }

        for field in CATEGORICAL_FIELDS {
            let categories = catalog.categories(field).unwrap_or(&[]);
            for category in categories.iter().skip(1) {
                if !seen.contains(indicator_column(field, category).as_str()) {
                    tracing::warn!(
                        "Category {:?} of {} has no feature column and will encode like the reference level",
                        category,
                        field
                    );
                }
            }
        }

        Ok(Self {
            columns,
            names: feature_names.to_vec(),
            catalog: catalog.clone(),
        })
    }

    fn resolve_name(name: &str, catalog: &CategoryCatalog) -> Result<Column, String> {
        if let Some(field) = NUMERIC_FIELDS.iter().copied().find(|f| *f == name) {
            return Ok(Column::Numeric { field });
        }

        for field in CATEGORICAL_FIELDS {
            let Some(category) = name
                .strip_prefix(field)
                .and_then(|rest| rest.strip_prefix('_'))
            else {
                continue;
            };
            let categories = catalog.categories(field).unwrap_or(&[]);
            return match categories.iter().position(|c| c == category) {
                Some(0) => Err(format!(
                    "feature {name} encodes the reference category of {field}"
                )),
                Some(idx) => Ok(Column::Indicator {
                    field,
                    category: idx,
                }),
                None => Err(format!(
                    "feature {name} refers to category {category:?} missing from the catalog"
                )),
            };
        }

        Err(format!("feature {name} is neither a numeric field nor a known indicator"))
    }

    /// Encode a raw record into unscaled feature values, in layout order.
    ///
    /// Categorical values are checked against the catalog for every
    /// categorical field, even one whose indicators were all dropped.
    ///
    /// # Errors
    /// Returns `InputError` for missing fields, non-numeric values or unknown
    /// categories.
    pub fn encode(&self, record: &RawRecord) -> Result<Vec<f64>, InputError> {
        let mut selected = [0usize; CATEGORICAL_FIELDS.len()];
        for (slot, field) in selected.iter_mut().zip(CATEGORICAL_FIELDS) {
            let value = record.category(field)?;
            *slot = self.catalog.position(field, value)?;
        }

        self.columns
            .iter()
            .map(|column| match column {
                Column::Numeric { field } => record.number(field),
                Column::Indicator { field, category } => {
                    let idx = CATEGORICAL_FIELDS
                        .iter()
                        .position(|f| f == field)
                        .unwrap_or_default();
                    Ok(if selected[idx] == *category { 1.0 } else { 0.0 })
                }
            })
            .collect()
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Catalog with the categories of the public loan default dataset.
    pub(crate) fn loan_catalog() -> CategoryCatalog {
        let mut catalog = CategoryCatalog::new();
        let entries: [(&str, &[&str]); 7] = [
            ("Education", &["Bachelor's", "High School", "Master's", "PhD"]),
            (
                "EmploymentType",
                &["Full-time", "Part-time", "Self-employed", "Unemployed"],
            ),
            ("MaritalStatus", &["Divorced", "Married", "Single"]),
            ("HasMortgage", &["No", "Yes"]),
            ("HasDependents", &["No", "Yes"]),
            (
                "LoanPurpose",
                &["Auto", "Business", "Education", "Home", "Other"],
            ),
            ("HasCoSigner", &["No", "Yes"]),
        ];
        for (field, categories) in entries {
            catalog.insert(field, categories.iter().map(|c| (*c).to_string()).collect());
        }
        catalog
    }

    pub(crate) fn scenario_record() -> RawRecord {
        RawRecord::new()
            .with("Age", 30.0)
            .with("Income", 50_000.0)
            .with("LoanAmount", 15_000.0)
            .with("CreditScore", 700.0)
            .with("MonthsEmployed", 60.0)
            .with("NumCreditLines", 2.0)
            .with("InterestRate", 0.08)
            .with("LoanTerm", 36.0)
            .with("DTIRatio", 0.40)
            .with("Education", "High School")
            .with("EmploymentType", "Full-time")
            .with("MaritalStatus", "Single")
            .with("HasMortgage", "No")
            .with("HasDependents", "No")
            .with("LoanPurpose", "Business")
            .with("HasCoSigner", "No")
    }

    fn reference_record() -> RawRecord {
        scenario_record()
            .with("Education", "Bachelor's")
            .with("MaritalStatus", "Divorced")
            .with("LoanPurpose", "Auto")
    }

    #[test]
    fn test_from_catalog_orders_numeric_then_indicators() {
        let layout = FeatureLayout::from_catalog(&loan_catalog()).expect("layout");
        let names = layout.feature_names();
        assert_eq!(names.len(), 9 + 3 + 3 + 2 + 1 + 1 + 4 + 1);
        assert_eq!(&names[..9], &NUMERIC_FIELDS.map(String::from)[..]);
        assert_eq!(names[9], "Education_High School");
        assert_eq!(names.last().map(String::as_str), Some("HasCoSigner_Yes"));
    }

    #[test]
    fn test_reference_categories_encode_as_zero() {
        let layout = FeatureLayout::from_catalog(&loan_catalog()).expect("layout");
        let encoded = layout.encode(&reference_record()).expect("encode");

        assert_eq!(encoded.len(), layout.len());
        for (column, value) in layout.columns().iter().zip(&encoded) {
            if let Column::Indicator { .. } = column {
                assert_eq!(*value, 0.0);
            }
        }
    }

    #[test]
    fn test_encode_sets_single_indicator_per_field() {
        let layout = FeatureLayout::from_catalog(&loan_catalog()).expect("layout");
        let encoded = layout.encode(&scenario_record()).expect("encode");

        let hot: Vec<&str> = layout
            .feature_names()
            .iter()
            .zip(&encoded)
            .filter(|(name, v)| **v == 1.0 && name.contains('_'))
            .map(|(name, _)| name.as_str())
            .collect();
        assert_eq!(
            hot,
            vec![
                "Education_High School",
                "MaritalStatus_Single",
                "LoanPurpose_Business"
            ]
        );
        assert_eq!(encoded[3], 700.0);
    }

    #[test]
    fn test_resolve_follows_persisted_order() {
        let catalog = loan_catalog();
        let mut names: Vec<String> = FeatureLayout::from_catalog(&catalog)
            .expect("layout")
            .feature_names()
            .to_vec();
        names.reverse();

        let layout = FeatureLayout::resolve(&names, &catalog).expect("resolve");
        let encoded = layout.encode(&scenario_record()).expect("encode");
        assert_eq!(encoded.last(), Some(&30.0));
    }

    #[test]
    fn test_resolve_drops_columns_missing_from_feature_names() {
        let catalog = loan_catalog();
        let names: Vec<String> = FeatureLayout::from_catalog(&catalog)
            .expect("layout")
            .feature_names()
            .iter()
            .filter(|n| !n.starts_with("LoanPurpose_"))
            .cloned()
            .collect();

        let layout = FeatureLayout::resolve(&names, &catalog).expect("resolve");
        let encoded = layout.encode(&scenario_record()).expect("encode");
        assert_eq!(encoded.len(), names.len());
    }

    #[test]
    fn test_resolve_rejects_inconsistent_names() {
        let catalog = loan_catalog();
        let names: Vec<String> = ["Age", "Age", "Education_Bachelor's", "LoanPurpose_Travel", "Zip"]
            .iter()
            .map(|s| (*s).to_string())
            .collect();

        let err = FeatureLayout::resolve(&names, &catalog).expect_err("inconsistent");
        assert!(err.problems.iter().any(|p| p.contains("duplicate")));
        assert!(err.problems.iter().any(|p| p.contains("reference category")));
        assert!(err.problems.iter().any(|p| p.contains("Travel")));
        assert!(err.problems.iter().any(|p| p.contains("Zip")));
        assert!(err.problems.iter().any(|p| p.contains("CreditScore")));
    }

    #[test]
    fn test_encode_rejects_unknown_category() {
        let layout = FeatureLayout::from_catalog(&loan_catalog()).expect("layout");
        let record = scenario_record().with("Education", "Kindergarten");
        assert!(matches!(
            layout.encode(&record),
            Err(InputError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_encode_rejects_missing_numeric_field() {
        let layout = FeatureLayout::from_catalog(&loan_catalog()).expect("layout");
        let mut record = scenario_record();
        record.remove("DTIRatio");
        assert_eq!(
            layout.encode(&record),
            Err(InputError::MissingField("DTIRatio".into()))
        );
    }

    #[test]
    fn test_encode_ignores_extra_fields() {
        let layout = FeatureLayout::from_catalog(&loan_catalog()).expect("layout");
        let plain = layout.encode(&scenario_record()).expect("encode");
        let extra = layout
            .encode(&scenario_record().with("LoanID", "I38PQUQS96"))
            .expect("encode");
        assert_eq!(plain, extra);
    }
}
