//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod narrator;
mod repositories;

pub use narrator::{NarrationError, NarratorPort};
pub use repositories::{
    ProjectRecord, ProjectRepositoryPort, ProjectStatus, RepositoryError, UserRecord,
    UserRepositoryPort, VoiceRecord, VoiceRepositoryPort, VoiceSeed,
};
