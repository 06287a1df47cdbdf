//! Narrator Port - 旁白合成引擎抽象
//!
//! 定义文本转音频的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 旁白合成错误
#[derive(Debug, Error)]
pub enum NarrationError {
    #[error("Audio encoding error: {0}")]
    EncodingError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Narrator Port
///
/// 给定源文本，在指定位置生成音频产物。
/// 实现必须满足：相同文本产生字节一致的输出（确定性），
/// 以便替换为真实 TTS 服务时不改变编排器契约
#[async_trait]
pub trait NarratorPort: Send + Sync {
    /// 合成旁白音频，返回写入的产物路径
    ///
    /// 父目录不存在时自动创建
    async fn synthesize(&self, text: &str, output_path: &Path)
        -> Result<PathBuf, NarrationError>;
}
