//! SQLite Project Repository
//!
//! 状态迁移使用条件 UPDATE（WHERE status = 预期值），
//! 单调性由存储层保证，重复/乱序的迁移请求落空而不是回退状态

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::DbPool;
use crate::application::ports::{
    ProjectRecord, ProjectRepositoryPort, ProjectStatus, RepositoryError,
};

/// SQLite Project Repository
pub struct SqliteProjectRepository {
    pool: DbPool,
}

impl SqliteProjectRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ProjectRow {
    id: String,
    user_id: String,
    voice_id: Option<String>,
    title: String,
    source_text: String,
    source_filename: Option<String>,
    language: Option<String>,
    style: Option<String>,
    status: String,
    audio_path: Option<String>,
    error_message: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ProjectRow> for ProjectRecord {
    type Error = RepositoryError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        Ok(ProjectRecord {
            id: Uuid::parse_str(&row.id)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            user_id: Uuid::parse_str(&row.user_id)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            voice_id: row
                .voice_id
                .as_deref()
                .map(Uuid::parse_str)
                .transpose()
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            title: row.title,
            source_text: row.source_text,
            source_filename: row.source_filename,
            language: row.language,
            style: row.style,
            status: ProjectStatus::from_str(&row.status).ok_or_else(|| {
                RepositoryError::SerializationError(format!(
                    "Unknown project status: {}",
                    row.status
                ))
            })?,
            audio_path: row.audio_path.map(PathBuf::from),
            error_message: row.error_message,
            created_at: DateTime::parse_from_rfc3339(&row.created_at)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?
                .with_timezone(&Utc),
            updated_at: DateTime::parse_from_rfc3339(&row.updated_at)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?
                .with_timezone(&Utc),
        })
    }
}

#[async_trait]
impl ProjectRepositoryPort for SqliteProjectRepository {
    async fn save(&self, project: &ProjectRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO project (
                id, user_id, voice_id, title, source_text, source_filename,
                language, style, status, audio_path, error_message, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(project.id.to_string())
        .bind(project.user_id.to_string())
        .bind(project.voice_id.map(|id| id.to_string()))
        .bind(&project.title)
        .bind(&project.source_text)
        .bind(&project.source_filename)
        .bind(&project.language)
        .bind(&project.style)
        .bind(project.status.as_str())
        .bind(
            project
                .audio_path
                .as_ref()
                .map(|p| p.to_string_lossy().to_string()),
        )
        .bind(&project.error_message)
        .bind(project.created_at.to_rfc3339())
        .bind(project.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ProjectRecord>, RepositoryError> {
        let row: Option<ProjectRow> = sqlx::query_as(
            "SELECT id, user_id, voice_id, title, source_text, source_filename, language, \
             style, status, audio_path, error_message, created_at, updated_at \
             FROM project WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.map(ProjectRecord::try_from).transpose()
    }

    async fn find_by_owner(&self, user_id: Uuid) -> Result<Vec<ProjectRecord>, RepositoryError> {
        let rows: Vec<ProjectRow> = sqlx::query_as(
            "SELECT id, user_id, voice_id, title, source_text, source_filename, language, \
             style, status, audio_path, error_message, created_at, updated_at \
             FROM project WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(ProjectRecord::try_from).collect()
    }

    async fn mark_processing(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE project SET status = 'processing', updated_at = ? \
             WHERE id = ? AND status = 'pending'",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_completed(&self, id: Uuid, audio_path: &Path) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE project SET status = 'completed', audio_path = ?, updated_at = ? \
             WHERE id = ? AND status = 'processing'",
        )
        .bind(audio_path.to_string_lossy().to_string())
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_failed(&self, id: Uuid, error_message: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE project SET status = 'failed', error_message = ?, updated_at = ? \
             WHERE id = ? AND status = 'processing'",
        )
        .bind(error_message)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn fail_all_processing(&self, error_message: &str) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE project SET status = 'failed', error_message = ?, updated_at = ? \
             WHERE status = 'processing'",
        )
        .bind(error_message)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
