use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub type ApiResult<T> = Result<T, ApiError>;

/// Per-field validation messages, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct FieldErrors(pub BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ok(()) when no errors were collected, otherwise the 422 error.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("the given data was invalid")]
    Validation(FieldErrors),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unprocessable: {0}")]
    Unprocessable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "errors": errors }),
            ),
            ApiError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Unauthorized", "message": message }),
            ),
            ApiError::Forbidden(message) => {
                (StatusCode::FORBIDDEN, json!({ "message": message }))
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, json!({ "message": message }))
            }
            ApiError::Conflict(message) => {
                (StatusCode::CONFLICT, json!({ "message": message }))
            }
            ApiError::Unprocessable(message) => {
                (StatusCode::UNPROCESSABLE_ENTITY, json!({ "message": message }))
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "Server error", "error": message }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                ApiError::Conflict(format!(
                    "Constraint violation: {}",
                    db_err.constraint().unwrap_or("unique")
                ))
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_collect_per_field() {
        let mut errors = FieldErrors::new();
        errors.add("email", "The email field is required");
        errors.add("email", "The email must be a valid email address");
        errors.add("password", "The password must be at least 6 characters");
        assert_eq!(errors.0["email"].len(), 2);
        assert_eq!(errors.0["password"].len(), 1);
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn empty_field_errors_are_ok() {
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn validation_error_serializes_field_map() {
        let mut errors = FieldErrors::new();
        errors.add("list_name", "The list name has already been taken");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json["list_name"][0],
            "The list name has already been taken"
        );
    }

    #[test]
    fn display_messages() {
        let err = ApiError::NotFound("List does not exist".into());
        assert_eq!(err.to_string(), "not found: List does not exist");
        let err = ApiError::Conflict("already added".into());
        assert!(err.to_string().starts_with("conflict"));
    }
}
