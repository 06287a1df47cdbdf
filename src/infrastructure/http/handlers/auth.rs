//! Auth HTTP Handlers - 注册与登录

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::ports::{RepositoryError, UserRecord};
use crate::infrastructure::auth::password::{hash_password, verify_password};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 注册响应，密码哈希永不返回
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
}

// ============================================================================
// Handlers
// ============================================================================

const MIN_PASSWORD_CHARS: usize = 6;

/// 结构校验：一个 @，本地部分非空，域名带点且不以点开头/结尾
fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// 注册新用户
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    if !state.allow_registration {
        return Err(ApiError::Forbidden("Registration is disabled".to_string()));
    }

    if !is_plausible_email(&req.email) {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }

    if req.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ApiError::BadRequest(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    if state.users.find_by_email(&req.email).await?.is_some() {
        return Err(ApiError::BadRequest("Email already registered".to_string()));
    }

    let password_hash = hash_password(&req.password)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))?;
    let user = UserRecord::new(req.email, password_hash);

    match state.users.save(&user).await {
        Ok(()) => {}
        // 并发注册同一邮箱时唯一约束兜底
        Err(RepositoryError::Duplicate(_)) => {
            return Err(ApiError::BadRequest("Email already registered".to_string()));
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
        }),
    ))
}

/// 登录，成功返回 Bearer 令牌
///
/// 未知邮箱与密码错误返回同一响应，不暴露账号存在性
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = state.users.find_by_email(&req.email).await?;
    let verified = user
        .as_ref()
        .map(|u| verify_password(&req.password, &u.password_hash))
        .unwrap_or(false);

    let user = match user {
        Some(u) if verified => u,
        _ => {
            return Err(ApiError::Unauthorized(
                "Incorrect email or password".to_string(),
            ));
        }
    };

    let access_token = state
        .tokens
        .issue(user.id)
        .map_err(|e| ApiError::Internal(format!("Failed to issue token: {}", e)))?;

    tracing::debug!(user_id = %user.id, "User logged in");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "bearer",
    }))
}
