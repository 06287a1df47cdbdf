//! Request Authentication - Bearer 令牌提取器
//!
//! 项目端点通过 `CurrentUser` 参数声明认证要求。
//! 缺失/伪造/过期令牌与令牌指向的用户不存在均为 401

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use std::sync::Arc;

use super::error::ApiError;
use super::state::AppState;
use crate::application::ports::UserRecord;

/// 当前认证用户
pub struct CurrentUser(pub UserRecord);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

        let user_id = state
            .tokens
            .verify(token)
            .ok_or_else(|| ApiError::Unauthorized("Invalid authentication credentials".to_string()))?;

        let user = state
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

        Ok(CurrentUser(user))
    }
}
