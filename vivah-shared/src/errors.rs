use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{service}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Auth errors
/// - E2xxx: Profile errors
/// - E3xxx: Matchmaking errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    Unauthorized,
    ServiceUnavailable,
    DeadlineExceeded,

    // Auth (E1xxx)
    TokenExpired,
    TokenInvalid,

    // Profile (E2xxx)
    ProfileNotFound,

    // Matchmaking (E3xxx)
    InvalidMatchAction,
    CannotActOnSelf,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::Unauthorized => "E0004",
            Self::ServiceUnavailable => "E0007",
            Self::DeadlineExceeded => "E0010",

            // Auth
            Self::TokenExpired => "E1004",
            Self::TokenInvalid => "E1005",

            // Profile
            Self::ProfileNotFound => "E2001",

            // Matchmaking
            Self::InvalidMatchAction => "E3001",
            Self::CannotActOnSelf => "E3002",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            Self::ValidationError | Self::InvalidMatchAction | Self::CannotActOnSelf => {
                StatusCode::BAD_REQUEST
            }
            Self::ProfileNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::TokenExpired | Self::TokenInvalid => StatusCode::UNAUTHORIZED,
        }
    }

    /// Client-fault codes are reported verbatim; everything else is logged.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// The error code this error will be reported with.
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Known { code, .. } => *code,
            AppError::Internal(_) | AppError::Database(_) => ErrorCode::InternalError,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Known {
            code: ErrorCode::ValidationError,
            message: format!("validation error: {errors}"),
            details: serde_json::to_value(errors.field_errors()).ok(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                if !code.is_client_error() {
                    tracing::error!(code = code.code(), error = %message, "request failed");
                }
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "database error"),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_fault_codes_map_to_4xx() {
        assert_eq!(ErrorCode::ProfileNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::InvalidMatchAction.status_code(), StatusCode::BAD_REQUEST);
        assert!(ErrorCode::CannotActOnSelf.is_client_error());
        assert!(!ErrorCode::InternalError.is_client_error());
    }

    #[test]
    fn deadline_maps_to_gateway_timeout() {
        assert_eq!(ErrorCode::DeadlineExceeded.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(ErrorCode::DeadlineExceeded.code(), "E0010");
    }

    #[test]
    fn internal_errors_hide_storage_details() {
        let err = AppError::Internal(anyhow::anyhow!("connection refused to 10.0.0.7:5432"));
        assert_eq!(err.code(), ErrorCode::InternalError);
        assert_eq!(err.to_string(), "internal server error");
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
