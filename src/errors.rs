//! # Error Handling
//!
//! Every engine operation returns [`ApiError`]. The engine raises typed
//! failures and never swallows them; the transport layer only maps the kind to
//! a status code:
//!
//! - [`ApiError::NotFound`] → 404, the target identifier matched nothing
//! - [`ApiError::ValidationFailed`] → 422, the payload failed field rules
//! - [`ApiError::Database`] / [`ApiError::Internal`] → 500, details are logged
//!   through `tracing` and never sent to the caller
//!
//! Malformed queries (unknown operator, property, relation or computed
//! property) are internal errors: the caller gets a generic 500 and the
//! offending token only shows up in the server log.
//!
//! ```rust,ignore
//! use restcrate::ApiError;
//!
//! async fn handler(db: &DatabaseConnection) -> Result<Json<Row>, ApiError> {
//!     let row = Person::get(db, 42, &[], &[]).await?; // 404 if missing
//!     Ok(Json(row))
//! }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use std::fmt;

use crate::validation::{ValidationError, ValidationErrors};

/// API error type with automatic logging and sanitized responses
#[derive(Debug)]
pub enum ApiError {
    /// 404 Not Found - no entity matches the target identifier
    NotFound {
        /// Resource type (e.g., "person")
        resource: String,
        /// Optional ID that wasn't found
        id: Option<String>,
    },

    /// 422 Unprocessable Entity - payload failed field validation
    ValidationFailed {
        /// Field-level errors, sent to the caller as-is
        errors: Vec<ValidationError>,
    },

    /// 500 Internal Server Error - Database error (details logged, not exposed)
    Database {
        /// User-facing generic message
        message: String,
        /// Internal error (logged, not sent to user)
        internal: DbErr,
    },

    /// 500 Internal Server Error - malformed query or any other failure
    Internal {
        /// User-facing generic message
        message: String,
        /// Internal error details (logged, not sent to user)
        internal: Option<String>,
    },
}

impl ApiError {
    /// Create a 404 Not Found error
    pub fn not_found(resource: impl Into<String>, id: Option<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id,
        }
    }

    /// Create a 422 error from a list of field errors
    #[must_use]
    pub fn validation_failed(errors: Vec<ValidationError>) -> Self {
        Self::ValidationFailed { errors }
    }

    /// Create a 500 Internal Server Error from a database error
    ///
    /// The database error details are logged but NOT sent to the user.
    #[must_use]
    pub fn database(err: DbErr) -> Self {
        Self::Database {
            message: "A database error occurred".to_string(),
            internal: err,
        }
    }

    /// Create a 500 Internal Server Error with optional details
    pub fn internal(message: impl Into<String>, internal: Option<String>) -> Self {
        Self::Internal {
            message: message.into(),
            internal,
        }
    }

    /// A query string the engine could not translate.
    ///
    /// The caller only sees "Malformed query"; `details` goes to the log.
    pub fn malformed_query(details: impl Into<String>) -> Self {
        Self::internal("Malformed query", Some(details.into()))
    }

    /// HTTP status code for this error
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::ValidationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Database { .. } | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the user-facing error message (sanitized)
    fn user_message(&self) -> String {
        match self {
            Self::NotFound { resource, id } => {
                if let Some(id) = id {
                    format!("{resource} with ID '{id}' not found")
                } else {
                    format!("{resource} not found")
                }
            }
            Self::ValidationFailed { errors } => {
                if errors.len() == 1 {
                    errors[0].to_string()
                } else {
                    let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
                    format!("Validation failed: {}", joined.join(", "))
                }
            }
            Self::Database { message, .. } | Self::Internal { message, .. } => message.clone(),
        }
    }

    /// Log internal error details (not sent to user)
    fn log_internal(&self) {
        match self {
            Self::Database { internal, .. } => {
                tracing::error!(error = ?internal, "Database error occurred");
            }
            Self::Internal {
                internal: Some(details),
                message,
            } => {
                tracing::error!(details = %details, message = %message, "Internal error occurred");
            }
            _ => {
                tracing::debug!(
                    error = %self.user_message(),
                    status = %self.status_code(),
                    "API error"
                );
            }
        }
    }
}

/// Error response sent to users (sanitized)
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<ValidationError>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log_internal();

        let status = self.status_code();
        let response = match self {
            Self::ValidationFailed { errors } => ErrorResponse {
                error: "Validation failed".to_string(),
                details: Some(errors),
            },
            other => ErrorResponse {
                error: other.user_message(),
                details: None,
            },
        };

        (status, Json(response)).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for ApiError {}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::ValidationFailed {
            errors: errors.into_vec(),
        }
    }
}

/// Convert Sea-ORM `DbErr` to `ApiError`
///
/// - `DbErr::RecordNotFound` → 404
/// - everything else → 500, logged and sanitized
impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::RecordNotFound(msg) => {
                let resource = msg.split_whitespace().next().unwrap_or("Resource");
                Self::NotFound {
                    resource: resource.to_string(),
                    id: None,
                }
            }
            other => Self::database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_with_id() {
        let err = ApiError::not_found("person", Some("12".to_string()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.user_message(), "person with ID '12' not found");
    }

    #[test]
    fn test_not_found_without_id() {
        let err = ApiError::not_found("person", None);
        assert_eq!(err.user_message(), "person not found");
    }

    #[test]
    fn test_validation_failed_single_error() {
        let err = ApiError::validation_failed(vec![ValidationError::new("name", "is required")]);
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.user_message(), "name: is required");
    }

    #[test]
    fn test_validation_failed_multiple_errors() {
        let err = ApiError::validation_failed(vec![
            ValidationError::new("name", "is required"),
            ValidationError::new("age", "must be positive"),
        ]);
        assert_eq!(
            err.user_message(),
            "Validation failed: name: is required, age: must be positive"
        );
    }

    #[test]
    fn test_malformed_query_hides_details() {
        let err = ApiError::malformed_query("unknown operator 'between'");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "Malformed query");
        assert!(!err.to_string().contains("between"));
    }

    #[test]
    fn test_dberr_record_not_found_becomes_404() {
        let api_err: ApiError = DbErr::RecordNotFound("person not found".to_string()).into();
        assert_eq!(api_err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(api_err.user_message(), "person not found");
    }

    #[test]
    fn test_dberr_json_is_not_exposed() {
        let api_err: ApiError = DbErr::Json("invalid type: string, expected i32".to_string()).into();
        assert_eq!(api_err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api_err.user_message().contains("i32"));
    }

    #[test]
    fn test_all_other_dberr_become_500() {
        let test_cases = vec![
            DbErr::Custom("Any custom error".to_string()),
            DbErr::Type("Type error".to_string()),
            DbErr::Conn(sea_orm::RuntimeErr::Internal("gone".to_string())),
        ];

        for db_err in test_cases {
            let api_err: ApiError = db_err.into();
            assert_eq!(api_err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(api_err.user_message(), "A database error occurred");
        }
    }

    #[test]
    fn test_validation_errors_conversion() {
        let mut errors = ValidationErrors::new();
        errors.add(ValidationError::new("name", "too short"));
        let api_err: ApiError = errors.into();
        assert_eq!(api_err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
