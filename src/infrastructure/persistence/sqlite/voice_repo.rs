//! SQLite Voice Repository

use async_trait::async_trait;
use sqlx::FromRow;
use uuid::Uuid;

use super::database::is_unique_violation;
use super::DbPool;
use crate::application::ports::{RepositoryError, VoiceRecord, VoiceRepositoryPort, VoiceSeed};

/// SQLite Voice Repository
pub struct SqliteVoiceRepository {
    pool: DbPool,
}

impl SqliteVoiceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct VoiceRow {
    id: String,
    name: String,
    language: String,
    accent: Option<String>,
    gender: Option<String>,
    style: Option<String>,
    provider: Option<String>,
}

impl TryFrom<VoiceRow> for VoiceRecord {
    type Error = RepositoryError;

    fn try_from(row: VoiceRow) -> Result<Self, Self::Error> {
        Ok(VoiceRecord {
            id: Uuid::parse_str(&row.id)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            name: row.name,
            language: row.language,
            accent: row.accent,
            gender: row.gender,
            style: row.style,
            provider: row.provider,
        })
    }
}

#[async_trait]
impl VoiceRepositoryPort for SqliteVoiceRepository {
    async fn seed_if_empty(&self, seeds: &[VoiceSeed]) -> Result<bool, RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        // 事务内检查：已有任何行则跳过
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM voice")
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;
        if count > 0 {
            return Ok(false);
        }

        for seed in seeds {
            let result = sqlx::query(
                r#"
                INSERT INTO voice (id, name, language, accent, gender, style, provider)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(seed.name)
            .bind(seed.language)
            .bind(seed.accent)
            .bind(seed.gender)
            .bind(seed.style)
            .bind(seed.provider)
            .execute(&mut *tx)
            .await;

            if let Err(e) = result {
                // 并发种子写入触发 name 唯一约束时按已填充处理
                if is_unique_violation(&e) {
                    return Ok(false);
                }
                return Err(RepositoryError::DatabaseError(e.to_string()));
            }
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;
        Ok(true)
    }

    async fn find_all(&self) -> Result<Vec<VoiceRecord>, RepositoryError> {
        // rowid 顺序即种子写入顺序
        let rows: Vec<VoiceRow> = sqlx::query_as(
            "SELECT id, name, language, accent, gender, style, provider FROM voice ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(VoiceRecord::try_from).collect()
    }
}
