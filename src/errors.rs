use crate::validation::ValidationErrors;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Message returned with every validation failure.
pub const INVALID_DATA_MESSAGE: &str = "Invalid data given";

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// Database-related errors.
    DatabaseError(sqlx::Error),
    /// Payload rejected by the member rule table.
    Validation(ValidationErrors),
    /// Referenced list or member is absent locally.
    NotFound(String),
    /// The MailChimp call failed; carries the vendor's message verbatim.
    RemoteError(String),
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    pub fn list_not_found(list_id: &str) -> Self {
        AppError::NotFound(format!("MailChimpList[{}] not found", list_id))
    }

    pub fn member_not_found(member_id: &str, list_id: &str) -> Self {
        AppError::NotFound(format!(
            "MailChimpMember[member_id: {}, list_id: {}] not found",
            member_id, list_id
        ))
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(e) => write!(f, "Database error: {}", e),
            AppError::Validation(errors) => {
                write!(f, "{}: {}", INVALID_DATA_MESSAGE, errors.fields().join(", "))
            }
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::RemoteError(msg) => write!(f, "MailChimp error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Maps each error variant to an HTTP status code and a `{message}` JSON body.
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::DatabaseError(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "Database error" }),
                )
            }
            AppError::Validation(errors) => {
                tracing::debug!("Validation failed on: {:?}", errors.fields());
                (
                    StatusCode::BAD_REQUEST,
                    json!({ "message": INVALID_DATA_MESSAGE, "errors": errors }),
                )
            }
            AppError::NotFound(msg) => {
                tracing::debug!("{}", msg);
                (StatusCode::NOT_FOUND, json!({ "message": msg }))
            }
            AppError::RemoteError(msg) => {
                tracing::error!("MailChimp error: {}", msg);
                (StatusCode::BAD_REQUEST, json!({ "message": msg }))
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "Internal server error" }),
                )
            }
            AppError::WithContext { source, context } => {
                tracing::error!("Error with context: {} -> {}", context, source);
                return source.into_response();
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::RemoteError(err.to_string())
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}

/// Extension for sqlx::Error to add context
impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::DatabaseError(e)),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(AppError::DatabaseError(e)),
            context: f(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_not_found_maps_to_404_with_message() {
        let response = AppError::list_not_found("L1").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["message"], "MailChimpList[L1] not found");
    }

    #[tokio::test]
    async fn test_validation_carries_field_errors() {
        let mut errors = ValidationErrors::default();
        errors.add("status", "The status field is required.");
        let response = AppError::Validation(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], INVALID_DATA_MESSAGE);
        assert_eq!(body["errors"]["status"][0], "The status field is required.");
    }

    #[tokio::test]
    async fn test_remote_error_passes_message_through() {
        let response = AppError::RemoteError("Resource Not Found".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["message"], "Resource Not Found");
    }

    #[tokio::test]
    async fn test_context_delegates_to_source_status() {
        let err: Result<(), AppError> =
            Err(AppError::member_not_found("m1", "L1")).context("loading member");
        let response = err.unwrap_err().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await["message"],
            "MailChimpMember[member_id: m1, list_id: L1] not found"
        );
    }

    #[test]
    fn test_database_error_hides_details() {
        let response = AppError::DatabaseError(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_sqlx_context_wraps_database_error() {
        let err = Err::<(), _>(sqlx::Error::RowNotFound)
            .context("Failed to delete member")
            .unwrap_err();
        match &err {
            AppError::WithContext { source, context } => {
                assert_eq!(context, "Failed to delete member");
                assert!(matches!(**source, AppError::DatabaseError(_)));
            }
            other => panic!("expected context, got {:?}", other),
        }
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
