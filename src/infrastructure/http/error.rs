//! HTTP Error Handling
//!
//! 请求期错误统一在 API 边界收口成结构化响应，
//! 后台任务错误不经过这里（落到项目记录的 error_message）

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::ports::RepositoryError;
use crate::infrastructure::adapters::ExtractionError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// API 错误
///
/// 所有权校验失败与资源不存在同样表现为 NotFound，
/// 不向调用方泄露他人资源的存在性
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Gone(String),
    UnsupportedMedia(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => {
                tracing::warn!(error = %msg, "Bad request");
                (StatusCode::BAD_REQUEST, msg)
            }
            ApiError::Unauthorized(msg) => {
                tracing::warn!(error = %msg, "Authentication failed");
                (StatusCode::UNAUTHORIZED, msg)
            }
            ApiError::Forbidden(msg) => {
                tracing::warn!(error = %msg, "Access forbidden");
                (StatusCode::FORBIDDEN, msg)
            }
            ApiError::NotFound(msg) => {
                tracing::warn!(error = %msg, "Resource not found");
                (StatusCode::NOT_FOUND, msg)
            }
            ApiError::Gone(msg) => {
                tracing::warn!(error = %msg, "Resource gone");
                (StatusCode::GONE, msg)
            }
            ApiError::UnsupportedMedia(msg) => {
                tracing::warn!(error = %msg, "Unsupported media type");
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, msg)
            }
            ApiError::Internal(msg) => {
                // 内部细节只进日志，响应体保持不透明
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound(msg) => ApiError::NotFound(msg),
            RepositoryError::Duplicate(_) => ApiError::BadRequest(e.to_string()),
            _ => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ExtractionError> for ApiError {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::UnsupportedFormat(_) => ApiError::UnsupportedMedia(e.to_string()),
            _ => ApiError::BadRequest(e.to_string()),
        }
    }
}
