//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（Narrator、Repositories）
//! - catalog: 内置音色目录种子

pub mod catalog;
pub mod ports;

// Re-exports
pub use ports::{
    NarrationError, NarratorPort, ProjectRecord, ProjectRepositoryPort, ProjectStatus,
    RepositoryError, UserRecord, UserRepositoryPort, VoiceRecord, VoiceRepositoryPort, VoiceSeed,
};
