//! Overdub - 异步旁白合成后台
//!
//! 多租户语音旁白服务：用户注册登录，上传或粘贴文本，
//! 后台任务将文本合成为可下载的 WAV 音频
//!
//! 应用层 (application/):
//! - Ports: 端口定义（UserRepository, VoiceRepository, ProjectRepository, Narrator）
//! - Catalog: 内置音色目录种子
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API（认证、项目 CRUD、音频下载）
//! - Auth: 密码哈希与 Bearer 令牌
//! - Worker: NarrationWorker 后台合成
//! - Persistence: SQLite 存储
//! - Adapters: 文档文本提取、正弦波合成器

pub mod application;
pub mod config;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
