//! Narration Worker - Background Synthesis Task Processor

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::application::ports::{NarratorPort, ProjectRepositoryPort};

/// 启动时清理中断任务使用的错误信息
const INTERRUPTED_MESSAGE: &str = "Processing interrupted before completion";

/// Worker 配置
#[derive(Debug, Clone)]
pub struct NarrationWorkerConfig {
    /// 最大并发合成数
    pub max_concurrent: usize,
    /// 合成产物输出目录
    pub storage_dir: PathBuf,
}

impl Default for NarrationWorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 2,
            storage_dir: PathBuf::from("data/audio"),
        }
    }
}

/// 合成 Worker
///
/// 后台任务处理器，从队列消费项目 ID 并执行语音合成
pub struct NarrationWorker {
    config: NarrationWorkerConfig,
    queue_receiver: mpsc::Receiver<Uuid>,
    projects: Arc<dyn ProjectRepositoryPort>,
    narrator: Arc<dyn NarratorPort>,
}

impl NarrationWorker {
    pub fn new(
        config: NarrationWorkerConfig,
        queue_receiver: mpsc::Receiver<Uuid>,
        projects: Arc<dyn ProjectRepositoryPort>,
        narrator: Arc<dyn NarratorPort>,
    ) -> Self {
        Self {
            config,
            queue_receiver,
            projects,
            narrator,
        }
    }

    /// 启动 Worker
    pub async fn run(mut self) {
        tracing::info!(
            max_concurrent = self.config.max_concurrent,
            "NarrationWorker started"
        );

        self.sweep_interrupted().await;

        // 使用 semaphore 控制并发
        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.config.max_concurrent));

        while let Some(project_id) = self.queue_receiver.recv().await {
            let permit = semaphore.clone().acquire_owned().await;
            if permit.is_err() {
                tracing::error!("Failed to acquire semaphore permit");
                continue;
            }
            let permit = permit.unwrap();

            let projects = self.projects.clone();
            let narrator = self.narrator.clone();
            let storage_dir = self.config.storage_dir.clone();

            tokio::spawn(async move {
                let _permit = permit; // 持有 permit 直到任务完成

                Self::process_project(project_id, projects, narrator, &storage_dir).await;
            });
        }

        tracing::info!("NarrationWorker stopped");
    }

    /// 清理上次运行遗留的 processing 项目
    ///
    /// 队列不落盘，进程重启后这些项目不会再被拾取，统一标记为 failed
    async fn sweep_interrupted(&self) {
        match self.projects.fail_all_processing(INTERRUPTED_MESSAGE).await {
            Ok(0) => {}
            Ok(count) => {
                tracing::warn!(count = count, "Interrupted projects marked as failed");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to sweep interrupted projects");
            }
        }
    }

    /// 处理单个项目
    async fn process_project(
        project_id: Uuid,
        projects: Arc<dyn ProjectRepositoryPort>,
        narrator: Arc<dyn NarratorPort>,
        storage_dir: &Path,
    ) {
        // 获取项目信息
        let project = match projects.find_by_id(project_id).await {
            Ok(Some(p)) => p,
            Ok(None) => {
                tracing::warn!(project_id = %project_id, "Project not found, skipping");
                return;
            }
            Err(e) => {
                tracing::error!(project_id = %project_id, error = %e, "Failed to load project");
                return;
            }
        };

        // 认领项目；已被拾取或已结束的跳过
        match projects.mark_processing(project_id).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(project_id = %project_id, "Project not pending, skipping");
                return;
            }
            Err(e) => {
                tracing::error!(project_id = %project_id, error = %e, "Failed to claim project");
                return;
            }
        }

        let output_path = storage_dir.join(project.artifact_filename());

        match narrator.synthesize(&project.source_text, &output_path).await {
            Ok(audio_path) => {
                match projects.mark_completed(project_id, &audio_path).await {
                    Ok(true) => {
                        tracing::info!(
                            project_id = %project_id,
                            audio_path = %audio_path.display(),
                            "Narration completed"
                        );
                    }
                    Ok(false) => {
                        tracing::warn!(
                            project_id = %project_id,
                            "Project no longer processing, completion dropped"
                        );
                    }
                    Err(e) => {
                        tracing::error!(
                            project_id = %project_id,
                            error = %e,
                            "Failed to record completion"
                        );
                    }
                }
            }
            Err(e) => {
                tracing::error!(project_id = %project_id, error = %e, "Narration failed");
                if let Err(e) = projects.mark_failed(project_id, &e.to_string()).await {
                    tracing::error!(
                        project_id = %project_id,
                        error = %e,
                        "Failed to record failure"
                    );
                }
            }
        }
    }
}
