//! Overdub - 异步旁白合成后台
//!
//! - Application: ports, catalog
//! - Infrastructure: http, auth, worker, persistence, adapters

use std::sync::Arc;

use chrono::Duration;
use overdub::application::catalog;
use overdub::config::{load_config, print_config};
use overdub::infrastructure::adapters::SineWaveNarrator;
use overdub::infrastructure::auth::TokenService;
use overdub::infrastructure::http::{AppState, HttpServer};
use overdub::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteProjectRepository, SqliteUserRepository,
    SqliteVoiceRepository,
};
use overdub::infrastructure::worker::{narration_channel, NarrationWorker, NarrationWorkerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},overdub={},tower_http=debug",
        config.log.level, config.log.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Overdub - 异步旁白合成后台");
    print_config(&config);

    if config.auth.secret_key == "change-me" {
        tracing::warn!("Using the default signing secret; set OVERDUB_AUTH__SECRET_KEY in production");
    }

    // 确保数据目录存在
    tokio::fs::create_dir_all(&config.storage.audio_dir).await?;
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 初始化数据库
    let db_config = DatabaseConfig {
        database_url: config.database.database_url(),
        max_connections: config.database.max_connections,
    };
    let pool = create_pool(&db_config).await?;
    run_migrations(&pool).await?;

    // 创建 Repository 适配器
    let users = Arc::new(SqliteUserRepository::new(pool.clone()));
    let voices = Arc::new(SqliteVoiceRepository::new(pool.clone()));
    let projects = Arc::new(SqliteProjectRepository::new(pool.clone()));

    // 物化音色目录
    catalog::ensure_seeded(voices.as_ref()).await?;

    // 令牌服务
    let tokens = TokenService::new(
        &config.auth.secret_key,
        Duration::minutes(config.auth.token_ttl_minutes as i64),
    );

    // 创建合成队列与 Worker
    let (queue, queue_rx) = narration_channel(config.worker.queue_capacity);
    let worker_config = NarrationWorkerConfig {
        max_concurrent: config.worker.max_concurrent,
        storage_dir: config.storage.audio_dir.clone(),
    };
    let worker = NarrationWorker::new(
        worker_config,
        queue_rx,
        projects.clone(),
        Arc::new(SineWaveNarrator::with_defaults()),
    );

    // 启动 Worker
    tokio::spawn(worker.run());

    // 创建 HTTP 服务器
    let state = AppState::new(
        users,
        voices,
        projects,
        tokens,
        queue,
        config.server.app_name.clone(),
        config.auth.allow_registration,
    );

    let server = HttpServer::new(config.server.clone(), state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to listen for ctrl-c");
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
