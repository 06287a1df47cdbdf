//! Voice Catalog - 音色目录种子
//!
//! 固定的内置音色集合，首次启动时物化到存储。
//! 音色对客户端只读，目录一旦存在任何行，种子写入即为空操作

use crate::application::ports::{RepositoryError, VoiceRepositoryPort, VoiceSeed};

/// 内置音色集合
pub const DEFAULT_VOICES: &[VoiceSeed] = &[
    VoiceSeed {
        name: "Ava",
        language: "en",
        accent: Some("US"),
        gender: Some("female"),
        style: Some("narration"),
        provider: Some("placeholder"),
    },
    VoiceSeed {
        name: "Noah",
        language: "en",
        accent: Some("US"),
        gender: Some("male"),
        style: Some("storyteller"),
        provider: Some("placeholder"),
    },
    VoiceSeed {
        name: "Isabella",
        language: "en",
        accent: Some("UK"),
        gender: Some("female"),
        style: Some("dramatic"),
        provider: Some("placeholder"),
    },
    VoiceSeed {
        name: "Mateo",
        language: "es",
        accent: Some("LatAm"),
        gender: Some("male"),
        style: Some("neutral"),
        provider: Some("placeholder"),
    },
];

/// 确保音色目录已填充种子数据
///
/// 幂等：重复调用不会增加行数。启动时与每次目录读取前均可安全调用
pub async fn ensure_seeded(voices: &dyn VoiceRepositoryPort) -> Result<(), RepositoryError> {
    if voices.seed_if_empty(DEFAULT_VOICES).await? {
        tracing::info!(count = DEFAULT_VOICES.len(), "Voice catalog seeded");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_voices_shape() {
        assert_eq!(DEFAULT_VOICES.len(), 4);
        let names: Vec<&str> = DEFAULT_VOICES.iter().map(|v| v.name).collect();
        assert_eq!(names, ["Ava", "Noah", "Isabella", "Mateo"]);
        // 种子依赖 name 唯一约束兜底并发，名字必须互不相同
        for (i, a) in DEFAULT_VOICES.iter().enumerate() {
            for b in &DEFAULT_VOICES[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }
}
