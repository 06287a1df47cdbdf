//! SQLite Database - 数据库连接和迁移

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// 数据库配置
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    pub database_url: String,
    /// 最大连接数
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./data/overdub.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl DatabaseConfig {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            database_url: format!("sqlite:{}?mode=rwc", path.as_ref().display()),
            max_connections: 5,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }
}

/// 数据库连接池
pub type DbPool = Pool<Sqlite>;

/// 创建数据库连接池
///
/// 连接级 PRAGMA（busy_timeout、synchronous、foreign_keys）通过
/// ConnectOptions 配置，池中每个连接行为一致
pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        // WAL 模式，允许并发读写
        .journal_mode(SqliteJournalMode::Wal)
        // 遇到锁时等待 5000ms 而不是立即失败
        .busy_timeout(Duration::from_millis(5000))
        // 同步模式 NORMAL（平衡性能和安全性）
        .synchronous(SqliteSynchronous::Normal)
        // 外键约束（project.user_id 归属关系）
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;

    tracing::info!("SQLite pool created with WAL mode and busy_timeout=5000ms");

    Ok(pool)
}

/// 唯一约束冲突判定
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map_or(false, |db| db.is_unique_violation())
}

/// 运行数据库迁移
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    // 创建 user 表
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 创建 voice 表（name 唯一约束兜底并发种子写入）
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS voice (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            language TEXT NOT NULL,
            accent TEXT,
            gender TEXT,
            style TEXT,
            provider TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 创建 project 表
    // voice_id 是弱引用（仅查询关联），不加外键约束
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS project (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            voice_id TEXT,
            title TEXT NOT NULL,
            source_text TEXT NOT NULL,
            source_filename TEXT,
            language TEXT,
            style TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            audio_path TEXT,
            error_message TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES user(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // 创建索引
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_project_user_id
        ON project(user_id)
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed");
    Ok(())
}
