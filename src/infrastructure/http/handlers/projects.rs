//! Project HTTP Handlers - 旁白项目提交、查询与音频下载

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

use crate::application::ports::ProjectRecord;
use crate::infrastructure::adapters::extract_text;
use crate::infrastructure::http::auth::CurrentUser;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// DTOs
// ============================================================================

/// 项目概要（列表项）
#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub title: String,
    pub status: String,
    pub language: Option<String>,
    pub style: Option<String>,
    pub voice_id: Option<Uuid>,
    /// 产物下载路径，仅在产物存在时出现
    pub audio_url: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 项目详情（含原文）
#[derive(Debug, Serialize)]
pub struct ProjectDetailResponse {
    pub id: Uuid,
    pub title: String,
    pub status: String,
    pub language: Option<String>,
    pub style: Option<String>,
    pub voice_id: Option<Uuid>,
    pub audio_url: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub source_text: String,
    pub source_filename: Option<String>,
}

fn audio_url_for(project: &ProjectRecord) -> Option<String> {
    project
        .audio_path
        .as_ref()
        .map(|_| format!("/projects/{}/audio", project.id))
}

impl From<ProjectRecord> for ProjectResponse {
    fn from(project: ProjectRecord) -> Self {
        let audio_url = audio_url_for(&project);
        Self {
            id: project.id,
            title: project.title,
            status: project.status.as_str().to_string(),
            language: project.language,
            style: project.style,
            voice_id: project.voice_id,
            audio_url,
            error_message: project.error_message,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

impl From<ProjectRecord> for ProjectDetailResponse {
    fn from(project: ProjectRecord) -> Self {
        let audio_url = audio_url_for(&project);
        Self {
            id: project.id,
            title: project.title,
            status: project.status.as_str().to_string(),
            language: project.language,
            style: project.style,
            voice_id: project.voice_id,
            audio_url,
            error_message: project.error_message,
            created_at: project.created_at,
            updated_at: project.updated_at,
            source_text: project.source_text,
            source_filename: project.source_filename,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// 提交旁白项目（multipart 表单）
///
/// 同时给出 text 与 file 时以文件的提取文本为准；
/// 创建成功后项目进入合成队列，响应立即返回
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ProjectDetailResponse>), ApiError> {
    let mut title: Option<String> = None;
    let mut voice_id_raw: Option<String> = None;
    let mut language: Option<String> = None;
    let mut style: Option<String> = None;
    let mut text: Option<String> = None;
    let mut file_bytes: Option<Vec<u8>> = None;
    let mut source_filename: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "title" => {
                title = Some(field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read title: {}", e))
                })?);
            }
            "voice_id" => {
                voice_id_raw = Some(field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read voice_id: {}", e))
                })?);
            }
            "language" => {
                language = Some(field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read language: {}", e))
                })?);
            }
            "style" => {
                style = Some(field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read style: {}", e))
                })?);
            }
            "text" => {
                text = Some(field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read text: {}", e))
                })?);
            }
            "file" => {
                source_filename = field.file_name().map(|s| s.to_string());
                file_bytes = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| {
                            ApiError::BadRequest(format!("Failed to read file: {}", e))
                        })?
                        .to_vec(),
                );
            }
            _ => {}
        }
    }

    let title = title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Title is required".to_string()))?;

    // 空字符串视为未选择音色
    let voice_id = match voice_id_raw.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(
            Uuid::parse_str(raw)
                .map_err(|_| ApiError::BadRequest("Invalid voice id".to_string()))?,
        ),
    };

    let mut source_text = text
        .map(|t| t.trim().to_string())
        .unwrap_or_default();
    if let Some(bytes) = file_bytes {
        let declared = source_filename.clone().unwrap_or_default();
        source_text = extract_text(&bytes, &declared)?.trim().to_string();
    }

    if source_text.is_empty() {
        return Err(ApiError::BadRequest(
            "No text provided for narration".to_string(),
        ));
    }

    let project = ProjectRecord::new_pending(
        user.0.id,
        title,
        source_text,
        source_filename,
        voice_id,
        language,
        style,
    );
    state.projects.save(&project).await?;
    state.queue.enqueue(project.id);

    tracing::info!(
        project_id = %project.id,
        user_id = %user.0.id,
        "Project created"
    );

    Ok((StatusCode::CREATED, Json(ProjectDetailResponse::from(project))))
}

/// 获取当前用户的项目列表（最近创建在前）
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Vec<ProjectResponse>>, ApiError> {
    let projects = state.projects.find_by_owner(user.0.id).await?;
    Ok(Json(projects.into_iter().map(ProjectResponse::from).collect()))
}

/// 获取项目详情
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ProjectDetailResponse>, ApiError> {
    let project = load_owned_project(&state, project_id, user.0.id).await?;
    Ok(Json(ProjectDetailResponse::from(project)))
}

/// 下载合成音频
pub async fn download_audio(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Path(project_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let project = load_owned_project(&state, project_id, user.0.id).await?;

    let audio_path = project
        .audio_path
        .as_ref()
        .ok_or_else(|| ApiError::BadRequest("Audio not available yet".to_string()))?;

    if !audio_path.exists() {
        return Err(ApiError::Gone("Audio file missing".to_string()));
    }

    let file = tokio::fs::File::open(audio_path)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to open audio file: {}", e)))?;
    let metadata = file
        .metadata()
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to get file metadata: {}", e)))?;

    let filename = audio_path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
        .unwrap_or_else(|| project.artifact_filename());

    // 流式返回文件内容
    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "audio/wav")
        .header(header::CONTENT_LENGTH, metadata.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(body)
        .unwrap())
}

/// 加载项目并校验所有权；缺失与非本人项目同样返回 NotFound
async fn load_owned_project(
    state: &AppState,
    project_id: Uuid,
    user_id: Uuid,
) -> Result<ProjectRecord, ApiError> {
    state
        .projects
        .find_by_id(project_id)
        .await?
        .filter(|p| p.user_id == user_id)
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))
}
