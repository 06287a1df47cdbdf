//! Repository Ports - 出站端口
//!
//! 定义数据持久化的抽象接口
//! 具体实现在 infrastructure 层（如 SQLite）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// ============================================================================
// User Repository
// ============================================================================

/// 用户实体（用于持久化）
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// 创建新用户记录
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            created_at: Utc::now(),
        }
    }
}

/// User Repository Port
#[async_trait]
pub trait UserRepositoryPort: Send + Sync {
    /// 保存用户；邮箱冲突返回 Duplicate
    async fn save(&self, user: &UserRecord) -> Result<(), RepositoryError>;

    /// 根据 ID 查找用户
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, RepositoryError>;

    /// 根据邮箱查找用户
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepositoryError>;
}

// ============================================================================
// Voice Repository
// ============================================================================

/// 音色实体（用于持久化）
#[derive(Debug, Clone)]
pub struct VoiceRecord {
    pub id: Uuid,
    pub name: String,
    pub language: String,
    pub accent: Option<String>,
    pub gender: Option<String>,
    pub style: Option<String>,
    pub provider: Option<String>,
}

/// 内置音色种子（目录为空时批量写入）
#[derive(Debug, Clone, Copy)]
pub struct VoiceSeed {
    pub name: &'static str,
    pub language: &'static str,
    pub accent: Option<&'static str>,
    pub gender: Option<&'static str>,
    pub style: Option<&'static str>,
    pub provider: Option<&'static str>,
}

/// Voice Repository Port
#[async_trait]
pub trait VoiceRepositoryPort: Send + Sync {
    /// 目录为空时写入种子集；返回是否执行了写入
    ///
    /// 并发调用不会产生重复行（事务内检查 + name 唯一约束兜底）
    async fn seed_if_empty(&self, seeds: &[VoiceSeed]) -> Result<bool, RepositoryError>;

    /// 获取所有音色
    async fn find_all(&self) -> Result<Vec<VoiceRecord>, RepositoryError>;
}

// ============================================================================
// Project Repository
// ============================================================================

/// 旁白项目处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectStatus {
    /// 等待处理
    Pending,
    /// 合成中
    Processing,
    /// 已完成
    Completed,
    /// 处理失败
    Failed,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Pending => "pending",
            ProjectStatus::Processing => "processing",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ProjectStatus::Pending),
            "processing" => Some(ProjectStatus::Processing),
            "completed" => Some(ProjectStatus::Completed),
            "failed" => Some(ProjectStatus::Failed),
            _ => None,
        }
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::Pending
    }
}

/// 旁白项目实体（用于持久化）
#[derive(Debug, Clone)]
pub struct ProjectRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub voice_id: Option<Uuid>,
    pub title: String,
    pub source_text: String,
    pub source_filename: Option<String>,
    pub language: Option<String>,
    pub style: Option<String>,
    pub status: ProjectStatus,
    pub audio_path: Option<PathBuf>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectRecord {
    /// 创建待处理的新项目记录
    #[allow(clippy::too_many_arguments)]
    pub fn new_pending(
        user_id: Uuid,
        title: String,
        source_text: String,
        source_filename: Option<String>,
        voice_id: Option<Uuid>,
        language: Option<String>,
        style: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            voice_id,
            title,
            source_text,
            source_filename,
            language,
            style,
            status: ProjectStatus::Pending,
            audio_path: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 音频产物文件名（项目 ID 派生，同一项目唯一）
    pub fn artifact_filename(&self) -> String {
        format!("project_{}.wav", self.id)
    }
}

/// Project Repository Port
///
/// 状态迁移是条件更新：只有当前状态符合预期才会写入，
/// 返回 false 表示状态已被推进（或记录不存在），调用方应跳过
#[async_trait]
pub trait ProjectRepositoryPort: Send + Sync {
    /// 保存项目
    async fn save(&self, project: &ProjectRecord) -> Result<(), RepositoryError>;

    /// 根据 ID 查找项目
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ProjectRecord>, RepositoryError>;

    /// 获取用户的所有项目（按创建时间倒序）
    async fn find_by_owner(&self, user_id: Uuid) -> Result<Vec<ProjectRecord>, RepositoryError>;

    /// pending -> processing
    async fn mark_processing(&self, id: Uuid) -> Result<bool, RepositoryError>;

    /// processing -> completed，同时记录产物路径
    async fn mark_completed(&self, id: Uuid, audio_path: &Path) -> Result<bool, RepositoryError>;

    /// processing -> failed，同时记录错误信息
    async fn mark_failed(&self, id: Uuid, error_message: &str) -> Result<bool, RepositoryError>;

    /// 将所有滞留在 processing 的项目标记为 failed（启动时孤儿清理）
    ///
    /// 返回受影响的行数
    async fn fail_all_processing(&self, error_message: &str) -> Result<u64, RepositoryError>;
}
