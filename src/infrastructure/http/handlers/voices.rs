//! Voice HTTP Handlers - 音色目录（只读）

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::catalog;
use crate::application::ports::VoiceRecord;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

#[derive(Debug, Serialize)]
pub struct VoiceResponse {
    pub id: Uuid,
    pub name: String,
    pub language: String,
    pub accent: Option<String>,
    pub gender: Option<String>,
    pub style: Option<String>,
    pub provider: Option<String>,
}

impl From<VoiceRecord> for VoiceResponse {
    fn from(voice: VoiceRecord) -> Self {
        Self {
            id: voice.id,
            name: voice.name,
            language: voice.language,
            accent: voice.accent,
            gender: voice.gender,
            style: voice.style,
            provider: voice.provider,
        }
    }
}

/// 获取音色目录
///
/// 当前对外公开（不要求认证），读取前确保种子已写入
pub async fn list_voices(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<VoiceResponse>>, ApiError> {
    catalog::ensure_seeded(state.voices.as_ref()).await?;

    let voices = state.voices.find_all().await?;
    Ok(Json(voices.into_iter().map(VoiceResponse::from).collect()))
}
