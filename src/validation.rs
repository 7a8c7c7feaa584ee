//! Validation Support
//!
//! Payloads reach the engine as untyped JSON, so field rules live in
//! [`RestResource::validate`](crate::RestResource::validate), which runs
//! before any write. A failed validation never touches the database and is
//! reported as a 422 carrying every field error that was collected.
//!
//! # Example
//!
//! ```rust,ignore
//! use restcrate::validation::{Operation, ValidationErrors, validators};
//!
//! async fn validate(
//!     db: &DatabaseConnection,
//!     payload: &serde_json::Value,
//!     operation: Operation,
//! ) -> Result<(), ValidationErrors> {
//!     let mut errors = ValidationErrors::new();
//!     if operation == Operation::Create {
//!         errors.check(validators::validate_required_field(payload, "name"));
//!     }
//!     if let Some(name) = payload.get("name").and_then(|v| v.as_str()) {
//!         errors.check(validators::validate_length("name", name, Some(2), Some(64)));
//!     }
//!     errors.result()
//! }
//! ```

use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::core::RestResource;
use crate::errors::ApiError;
use crate::filtering::{Criterion, Operator, SearchRequest};

/// Validation error with field name and message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// The field that failed validation
    pub field: String,
    /// Human-readable error message
    pub message: String,
}

impl ValidationError {
    /// Create a new validation error
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Collection of validation errors
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Record the error of a failed check, ignore a passing one
    pub fn check(&mut self, outcome: Result<(), ValidationError>) {
        if let Err(error) = outcome {
            self.add(error);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<ValidationError> {
        self.errors
    }

    /// Convert to Result
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one error was collected.
    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed with {} error(s):", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// The write a payload is validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
}

/// Check that every id refers to an existing `R` row.
///
/// Goes through the resource's own search with an `id in (...)` criterion,
/// so it sees exactly what the API sees. Duplicate ids are counted once.
///
/// # Errors
///
/// Propagates database failures of the lookup itself.
pub async fn entity_exists<R: RestResource>(
    db: &DatabaseConnection,
    ids: &[i32],
) -> Result<bool, ApiError> {
    let distinct: BTreeSet<i32> = ids.iter().copied().collect();
    if distinct.is_empty() {
        return Ok(true);
    }

    let joined = distinct
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");

    let mut request = SearchRequest::default();
    request.criteria.push(Criterion::new(
        sea_orm::IdenStatic::as_str(&R::ID_COLUMN),
        Operator::In,
        joined,
    ));

    let found = R::count(db, &request).await?;
    Ok(usize::try_from(found).is_ok_and(|found| found == distinct.len()))
}

/// Helper validators for common patterns on JSON payloads
pub mod validators {
    use super::ValidationError;
    use serde_json::Value;
    use std::fmt;

    /// Validate string length is within range
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming `field` when out of range.
    pub fn validate_length(
        field: &str,
        value: &str,
        min: Option<usize>,
        max: Option<usize>,
    ) -> Result<(), ValidationError> {
        let len = value.chars().count();

        if let Some(min_len) = min
            && len < min_len
        {
            return Err(ValidationError::new(
                field,
                format!("Must be at least {min_len} characters"),
            ));
        }

        if let Some(max_len) = max
            && len > max_len
        {
            return Err(ValidationError::new(
                field,
                format!("Must be at most {max_len} characters"),
            ));
        }

        Ok(())
    }

    /// Validate number is within range
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming `field` when out of range.
    pub fn validate_range<T: PartialOrd + fmt::Display>(
        field: &str,
        value: T,
        min: Option<T>,
        max: Option<T>,
    ) -> Result<(), ValidationError> {
        if let Some(min_val) = min
            && value < min_val
        {
            return Err(ValidationError::new(field, format!("Must be at least {min_val}")));
        }

        if let Some(max_val) = max
            && value > max_val
        {
            return Err(ValidationError::new(field, format!("Must be at most {max_val}")));
        }

        Ok(())
    }

    /// Validate that a payload carries a non-null, non-blank value for `field`
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the key is missing, null or a blank
    /// string.
    pub fn validate_required_field(payload: &Value, field: &str) -> Result<(), ValidationError> {
        match payload.get(field) {
            None | Some(Value::Null) => Err(ValidationError::new(field, "This field is required")),
            Some(Value::String(s)) if s.trim().is_empty() => {
                Err(ValidationError::new(field, "This field is required"))
            }
            Some(_) => Ok(()),
        }
    }

    /// Validate that `field`, when present and non-null, is an integer
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for any other JSON type.
    pub fn validate_integer_field(payload: &Value, field: &str) -> Result<(), ValidationError> {
        match payload.get(field) {
            None | Some(Value::Null) => Ok(()),
            Some(value) if value.is_i64() || value.is_u64() => Ok(()),
            Some(_) => Err(ValidationError::new(field, "Must be an integer")),
        }
    }
}
