use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::auth::SessionError;
use crate::result::{error_codes, error_to_api_response};
use crate::store::StoreError;

/// HTTP 边界上的错误类型，所有下层错误都在这里转换为响应
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    RateLimited(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_and_code(&self) -> (StatusCode, i32) {
        match self {
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, error_codes::AUTH_FAILED),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, error_codes::NOT_FOUND),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, error_codes::VALIDATION_ERROR),
            AppError::Conflict(_) => (StatusCode::CONFLICT, error_codes::USER_EXISTS),
            AppError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, error_codes::RATE_LIMIT),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        (status, error_to_api_response::<()>(code, self.to_string())).into_response()
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::UserNotFound => AppError::NotFound("user not found".into()),
            SessionError::InvalidPassword => AppError::Unauthorized("invalid password".into()),
            SessionError::TokenGeneration(e) => {
                AppError::Internal(format!("failed to generate token: {}", e))
            }
            SessionError::TokenBlacklist(e) => {
                AppError::Internal(format!("failed to blacklist token: {}", e))
            }
            SessionError::SessionCleanup(e) => {
                AppError::Internal(format!("failed to clean user session: {}", e))
            }
            SessionError::CacheOperation { source, .. } => {
                AppError::Internal(format!("failed to cache user profile: {}", source))
            }
            SessionError::Store(e) => AppError::Internal(format!("database error: {}", e)),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            other => AppError::Internal(format!("database error: {}", other)),
        }
    }
}
