//! Application State
//!
//! Handler 共享的端口与服务集合，启动时装配一次

use std::sync::Arc;

use crate::application::ports::{ProjectRepositoryPort, UserRepositoryPort, VoiceRepositoryPort};
use crate::infrastructure::auth::TokenService;
use crate::infrastructure::worker::NarrationQueue;

/// 应用状态
pub struct AppState {
    pub users: Arc<dyn UserRepositoryPort>,
    pub voices: Arc<dyn VoiceRepositoryPort>,
    pub projects: Arc<dyn ProjectRepositoryPort>,
    pub tokens: TokenService,
    pub queue: NarrationQueue,
    pub app_name: String,
    pub allow_registration: bool,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        users: Arc<dyn UserRepositoryPort>,
        voices: Arc<dyn VoiceRepositoryPort>,
        projects: Arc<dyn ProjectRepositoryPort>,
        tokens: TokenService,
        queue: NarrationQueue,
        app_name: String,
        allow_registration: bool,
    ) -> Self {
        Self {
            users,
            voices,
            projects,
            tokens,
            queue,
            app_name,
            allow_registration,
        }
    }
}
