//! Root Handler
//!
//! 服务欢迎信息，无需认证

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::infrastructure::http::state::AppState;

/// 根端点响应
#[derive(Serialize)]
pub struct RootResponse {
    pub message: String,
    pub version: &'static str,
}

/// 服务信息
pub async fn root(State(state): State<Arc<AppState>>) -> Json<RootResponse> {
    Json(RootResponse {
        message: format!("{} API", state.app_name),
        version: env!("CARGO_PKG_VERSION"),
    })
}
