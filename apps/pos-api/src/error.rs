//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Resto POS                              │
//! │                                                                         │
//! │  Service function                                                      │
//! │  Result<T, ServiceError>                                               │
//! │         │                                                               │
//! │         ├── CoreError    ── kind() ──────────┐                         │
//! │         ├── DbError      ── constraint/500 ──┼──► ApiError ──► HTTP    │
//! │         └── GatewayError ── 502 ─────────────┘    { success: false,    │
//! │                                                     code, message,     │
//! │                                                     errors? }          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage and internal failures are logged with their detail and reach the
//! client as a generic message.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use resto_core::{CoreError, ErrorKind};
use resto_db::DbError;
use resto_payment::GatewayError;

// =============================================================================
// Service Error
// =============================================================================

/// What service functions return. Keeps the typed cause until the HTTP edge.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl From<resto_core::ValidationError> for ServiceError {
    fn from(err: resto_core::ValidationError) -> Self {
        ServiceError::Core(CoreError::Validation(err))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// API Error
// =============================================================================

/// Error body returned to clients.
///
/// ```json
/// {
///   "success": false,
///   "code": "PRECONDITION_FAILED",
///   "message": "Promo code HEMAT20 has reached its usage limit"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Per-field messages for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Missing or invalid credentials (401)
    Unauthorized,

    /// Authenticated but not allowed (403)
    Forbidden,

    /// Resource not found (404)
    NotFound,

    /// Duplicate resource (409)
    Conflict,

    /// Business rule not satisfied (422)
    PreconditionFailed,

    /// Payment gateway failure (502)
    GatewayError,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::PreconditionFailed => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::GatewayError => StatusCode::BAD_GATEWAY,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            errors: None,
        }
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut errors = BTreeMap::new();
        errors.insert(field.to_string(), message.clone());
        ApiError {
            code: ErrorCode::ValidationError,
            message,
            errors: Some(errors),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        if let CoreError::Validation(v) = &err {
            return ApiError::validation(v.field(), v.to_string());
        }
        if let CoreError::TableNumberRequired = &err {
            return ApiError::validation("table_number", err.to_string());
        }

        let code = match err.kind() {
            ErrorKind::Validation => ErrorCode::ValidationError,
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::Conflict => ErrorCode::Conflict,
            ErrorKind::PreconditionFailed => ErrorCode::PreconditionFailed,
            ErrorKind::Unauthorized => ErrorCode::Unauthorized,
            ErrorKind::Forbidden => ErrorCode::Forbidden,
        };
        ApiError::new(code, err.to_string())
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                ApiError::new(ErrorCode::Conflict, format!("{} '{}' already exists", field, value))
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::CheckViolation { message } => {
                tracing::warn!("Check constraint failed: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid value")
            }
            other => {
                // Log the actual error but return a generic message
                tracing::error!(error = %other, "Database operation failed");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts gateway errors to API errors.
impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::InvalidSignature => ApiError::unauthorized(err.to_string()),
            GatewayError::NotConfigured => {
                ApiError::new(ErrorCode::GatewayError, "Non-cash payment is not available")
            }
            other => {
                tracing::warn!(error = %other, "Payment gateway failure");
                ApiError::new(ErrorCode::GatewayError, "Payment gateway unavailable, please try again")
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Core(e) => e.into(),
            ServiceError::Db(e) => e.into(),
            ServiceError::Gateway(e) => e.into(),
        }
    }
}

impl From<resto_core::ValidationError> for ApiError {
    fn from(err: resto_core::ValidationError) -> Self {
        ApiError::from(CoreError::Validation(err))
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    code: ErrorCode,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a BTreeMap<String, String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            code: self.code,
            message: &self.message,
            errors: self.errors.as_ref(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = Result<T, ApiError>;
