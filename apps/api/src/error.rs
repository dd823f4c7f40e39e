//! # API Error Type
//!
//! What the client sees when a request fails: an HTTP status and a JSON
//! body `{ "code": "...", "message": "..." }`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ValidationError ─────────────────────────────► 400 VALIDATION_ERROR    │
//! │  missing / bad token ─────────────────────────► 401 UNAUTHENTICATED     │
//! │  role too low ────────────────────────────────► 403 FORBIDDEN           │
//! │  *NotFound ───────────────────────────────────► 404 NOT_FOUND           │
//! │  UNIQUE violation ────────────────────────────► 409 CONFLICT            │
//! │  other CoreError (rules) ─────────────────────► 422 BUSINESS_RULE       │
//! │  AfipError ───────────────────────────────────► 502 AFIP_ERROR          │
//! │  sqlx / pool / internal ──(logged)────────────► 500 INTERNAL_ERROR      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use gestor_core::{AfipError, CoreError, ValidationError};
use gestor_db::DbError;

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// A business rule rejected the request.
    #[error("{0}")]
    Unprocessable(String),

    /// AFIP (or another upstream) failed.
    #[error("{0}")]
    Upstream(String),

    /// Logged in full, answered with a generic message.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        ApiError::NotFound(format!("{} not found: {}", entity, id))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the client. Internal details are replaced.
    pub fn client_message(&self) -> String {
        match self {
            ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "VALIDATION_ERROR",
            ApiError::Unauthenticated(_) => "UNAUTHENTICATED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Unprocessable(_) => "BUSINESS_RULE",
            ApiError::Upstream(_) => "AFIP_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            error!(error = %detail, "Request failed with an internal error");
        }

        let body = ErrorBody {
            code: self.code(),
            message: self.client_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<AfipError> for ApiError {
    fn from(err: AfipError) -> Self {
        match err {
            AfipError::NotFiscal(_) => ApiError::Unprocessable(err.to_string()),
            AfipError::Rejected(_) | AfipError::Unavailable(_) => ApiError::Upstream(err.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(v) => v.into(),
            CoreError::Afip(a) => a.into(),
            CoreError::ProductNotFound(_)
            | CoreError::InvoiceNotFound(_)
            | CoreError::ClientNotFound(_) => ApiError::NotFound(err.to_string()),
            other => ApiError::Unprocessable(other.to_string()),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(core) => core.into(),
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::UniqueViolation { .. } | DbError::Conflict(_) if err.is_retryable() => {
                ApiError::Conflict(format!("{}, retry the request", err))
            }
            DbError::UniqueViolation { .. } | DbError::Conflict(_) => {
                ApiError::Conflict(err.to_string())
            }
            DbError::ForeignKeyViolation { .. } => {
                ApiError::Unprocessable("Referenced record does not exist".to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found: ApiError = DbError::not_found("Invoice", "x").into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let conflict: ApiError = DbError::duplicate("sku", "A-1").into();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let voided: ApiError = DbError::Domain(CoreError::AlreadyVoided {
            number: "FA-0001".into(),
        })
        .into();
        assert_eq!(voided.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let client: ApiError = CoreError::ClientNotFound("c1".into()).into();
        assert_eq!(client.status(), StatusCode::NOT_FOUND);

        let invalid: ApiError = DbError::Domain(CoreError::Validation(ValidationError::Required {
            field: "name".into(),
        }))
        .into();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let afip: ApiError = CoreError::Afip(AfipError::Unavailable("timeout".into())).into();
        assert_eq!(afip.status(), StatusCode::BAD_GATEWAY);

        let db: ApiError = DbError::PoolExhausted.into();
        assert_eq!(db.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_message_is_generic() {
        let err = ApiError::Internal("disk I/O error".into());
        assert_eq!(err.client_message(), "Internal server error");
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
