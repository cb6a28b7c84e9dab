//! Applicant data types for loan default risk prediction.
//!
//! Field names match the columns of the training dataset.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Numeric fields, in training column order.
pub const NUMERIC_FIELDS: [&str; 9] = [
    "Age",
    "Income",
    "LoanAmount",
    "CreditScore",
    "MonthsEmployed",
    "NumCreditLines",
    "InterestRate",
    "LoanTerm",
    "DTIRatio",
];

/// Categorical fields, in training column order.
pub const CATEGORICAL_FIELDS: [&str; 7] = [
    "Education",
    "EmploymentType",
    "MaritalStatus",
    "HasMortgage",
    "HasDependents",
    "LoanPurpose",
    "HasCoSigner",
];

/// Loan terms offered by the application form, in months.
pub const LOAN_TERMS: [u32; 10] = [12, 24, 36, 48, 60, 72, 84, 96, 108, 120];

/// Errors caused by a bad prediction request. The user may correct and resubmit.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Field {field} must be a finite number")]
    NonNumeric { field: String },

    #[error("Field {field} must be one of the listed categories, got a number")]
    ExpectedCategory { field: String },

    #[error("Unknown category {value:?} for {field} (allowed: {})", .allowed.join(", "))]
    UnknownCategory {
        field: String,
        value: String,
        allowed: Vec<String>,
    },
}

impl InputError {
    /// The offending field name.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::MissingField(field)
            | Self::NonNumeric { field }
            | Self::ExpectedCategory { field }
            | Self::UnknownCategory { field, .. } => field,
        }
    }
}

/// A single raw field value as submitted by a form or a JSON request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Raw input record: field name to value.
///
/// Fields that are not part of the model are tolerated and ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(BTreeMap<String, RawValue>);

impl RawRecord {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<RawValue>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn remove(&mut self, field: &str) -> Option<RawValue> {
        self.0.remove(field)
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&RawValue> {
        self.0.get(field)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read a numeric field. Text, NaN and infinities are rejected.
    ///
    /// # Errors
    /// Returns `InputError::MissingField` or `InputError::NonNumeric`.
    pub fn number(&self, field: &str) -> Result<f64, InputError> {
        match self.0.get(field) {
            None => Err(InputError::MissingField(field.to_string())),
            Some(RawValue::Number(v)) if v.is_finite() => Ok(*v),
            Some(_) => Err(InputError::NonNumeric {
                field: field.to_string(),
            }),
        }
    }

    /// Read a categorical field as text.
    ///
    /// # Errors
    /// Returns `InputError::MissingField` or `InputError::ExpectedCategory`.
    pub fn category(&self, field: &str) -> Result<&str, InputError> {
        match self.0.get(field) {
            None => Err(InputError::MissingField(field.to_string())),
            Some(RawValue::Text(v)) => Ok(v.as_str()),
            Some(RawValue::Number(_)) => Err(InputError::ExpectedCategory {
                field: field.to_string(),
            }),
        }
    }
}

/// Typed applicant profile collected by the application form.
///
/// `interest_rate` is a fraction (0.08 for 8%), as in the training data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantProfile {
    pub age: f64,
    pub income: f64,
    pub loan_amount: f64,
    pub credit_score: f64,
    pub months_employed: f64,
    pub num_credit_lines: f64,
    pub interest_rate: f64,
    pub loan_term: f64,
    pub dti_ratio: f64,
    pub education: String,
    pub employment_type: String,
    pub marital_status: String,
    pub has_mortgage: String,
    pub has_dependents: String,
    pub loan_purpose: String,
    pub has_co_signer: String,
}

impl ApplicantProfile {
    /// Numeric values in `NUMERIC_FIELDS` order.
    #[must_use]
    pub fn numeric_values(&self) -> [f64; 9] {
        [
            self.age,
            self.income,
            self.loan_amount,
            self.credit_score,
            self.months_employed,
            self.num_credit_lines,
            self.interest_rate,
            self.loan_term,
            self.dti_ratio,
        ]
    }

    /// Categorical values in `CATEGORICAL_FIELDS` order.
    #[must_use]
    pub fn categorical_values(&self) -> [&str; 7] {
        [
            self.education.as_str(),
            self.employment_type.as_str(),
            self.marital_status.as_str(),
            self.has_mortgage.as_str(),
            self.has_dependents.as_str(),
            self.loan_purpose.as_str(),
            self.has_co_signer.as_str(),
        ]
    }

    /// Convert into the raw record consumed by the preprocessor.
    #[must_use]
    pub fn to_raw_record(&self) -> RawRecord {
        let mut record = RawRecord::new();
        for (field, value) in NUMERIC_FIELDS.iter().zip(self.numeric_values()) {
            record.insert(*field, value);
        }
        for (field, value) in CATEGORICAL_FIELDS.iter().zip(self.categorical_values()) {
            record.insert(*field, value);
        }
        record
    }

    /// Check the form bounds. These are advisory: the model accepts values
    /// outside them, but predictions there are not meaningful.
    ///
    /// # Errors
    /// Returns every violation found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let ranges: [(&str, f64, f64, f64); 8] = [
            ("Age", self.age, 18.0, 70.0),
            ("Income", self.income, 10_000.0, 500_000.0),
            ("LoanAmount", self.loan_amount, 1_000.0, 1_000_000.0),
            ("CreditScore", self.credit_score, 300.0, 850.0),
            ("MonthsEmployed", self.months_employed, 0.0, 360.0),
            ("NumCreditLines", self.num_credit_lines, 1.0, 15.0),
            ("InterestRate", self.interest_rate, 0.0001, 0.30),
            ("DTIRatio", self.dti_ratio, 0.01, 0.99),
        ];
        for (name, value, min, max) in ranges {
            if !(min..=max).contains(&value) {
                errors.push(format!("{name} {value} out of range [{min}, {max}]"));
            }
        }

        if !LOAN_TERMS.iter().any(|t| f64::from(*t) == self.loan_term) {
            errors.push(format!(
                "LoanTerm {} must be a multiple of 12 between 12 and 120",
                self.loan_term
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ApplicantProfile {
        ApplicantProfile {
            age: 30.0,
            income: 50_000.0,
            loan_amount: 15_000.0,
            credit_score: 700.0,
            months_employed: 60.0,
            num_credit_lines: 2.0,
            interest_rate: 0.08,
            loan_term: 36.0,
            dti_ratio: 0.40,
            education: "High School".into(),
            employment_type: "Full-time".into(),
            marital_status: "Single".into(),
            has_mortgage: "No".into(),
            has_dependents: "No".into(),
            loan_purpose: "Business".into(),
            has_co_signer: "No".into(),
        }
    }

    #[test]
    fn test_profile_to_raw_record() {
        let record = sample().to_raw_record();
        assert_eq!(record.len(), 16);
        assert_eq!(record.number("CreditScore"), Ok(700.0));
        assert_eq!(record.category("LoanPurpose"), Ok("Business"));
    }

    #[test]
    fn test_number_rejects_text_and_nan() {
        let record = RawRecord::new()
            .with("Age", "thirty")
            .with("Income", f64::NAN);
        assert!(matches!(
            record.number("Age"),
            Err(InputError::NonNumeric { .. })
        ));
        assert!(matches!(
            record.number("Income"),
            Err(InputError::NonNumeric { .. })
        ));
        assert_eq!(
            record.number("LoanAmount"),
            Err(InputError::MissingField("LoanAmount".into()))
        );
    }

    #[test]
    fn test_category_rejects_number() {
        let record = RawRecord::new().with("Education", 2.0);
        assert!(matches!(
            record.category("Education"),
            Err(InputError::ExpectedCategory { .. })
        ));
    }

    #[test]
    fn test_raw_record_json_shape() {
        let record: RawRecord =
            serde_json::from_str(r#"{"Age": 30, "Education": "PhD"}"#).expect("parse");
        assert_eq!(record.number("Age"), Ok(30.0));
        assert_eq!(record.category("Education"), Ok("PhD"));
    }

    #[test]
    fn test_validation() {
        assert!(sample().validate().is_ok());

        let invalid = ApplicantProfile {
            age: 10.0,
            loan_term: 30.0,
            ..sample()
        };
        let errors = invalid.validate().expect_err("should fail");
        assert_eq!(errors.len(), 2);
    }
}
