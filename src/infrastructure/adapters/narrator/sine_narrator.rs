//! Sine Wave Narrator - 占位旁白合成器
//!
//! 以文本字符码点驱动的正弦音序列代替真实语音合成。
//! 相同文本产生字节一致的 WAV 输出，接入真实 TTS 服务时
//! 只需替换此适配器，编排器契约不变

use async_trait::async_trait;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::{Path, PathBuf};

use crate::application::ports::{NarrationError, NarratorPort};

/// 空文本时的替代文案
const FALLBACK_TEXT: &str = "Generated audio";
/// 基准频率（Hz）
const BASE_FREQUENCY: f64 = 220.0;
/// 振幅（16 位有符号范围内）
const AMPLITUDE: f64 = 12000.0;
/// 每秒朗读的字符数（决定时长）
const CHARS_PER_SECOND: f64 = 25.0;
/// 时长下限（秒）
const MIN_DURATION_SECS: f64 = 2.0;
/// 时长上限（秒）
const MAX_DURATION_SECS: f64 = 60.0;

/// Sine Wave Narrator 配置
#[derive(Debug, Clone)]
pub struct SineWaveNarratorConfig {
    /// 输出采样率（Hz）
    pub sample_rate: u32,
}

impl Default for SineWaveNarratorConfig {
    fn default() -> Self {
        Self { sample_rate: 22050 }
    }
}

/// 占位旁白合成器
///
/// 输出：单声道、16 位、固定采样率的线性 PCM WAV
pub struct SineWaveNarrator {
    config: SineWaveNarratorConfig,
}

impl SineWaveNarrator {
    pub fn new(config: SineWaveNarratorConfig) -> Self {
        Self { config }
    }

    /// 使用默认配置创建
    pub fn with_defaults() -> Self {
        Self::new(SineWaveNarratorConfig::default())
    }

    /// 同步渲染波形（CPU 密集，调用方负责放入阻塞线程）
    fn render(text: &str, output_path: &Path, sample_rate: u32) -> Result<(), NarrationError> {
        let source = if text.is_empty() { FALLBACK_TEXT } else { text };
        let chars: Vec<char> = source.chars().collect();

        // 时长随文本长度增长，夹在 [2, 60] 秒
        let duration_secs =
            (chars.len() as f64 / CHARS_PER_SECOND).clamp(MIN_DURATION_SECS, MAX_DURATION_SECS);
        let total_frames = (f64::from(sample_rate) * duration_secs) as u64;

        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(output_path, spec)
            .map_err(|e| NarrationError::EncodingError(e.to_string()))?;

        for frame in 0..total_frames {
            // 每帧的瞬时频率由对应位置的字符码点决定
            let code_point = chars[(frame as usize) % chars.len()] as u32;
            let frequency = BASE_FREQUENCY + f64::from(code_point % 60);
            let angle =
                2.0 * std::f64::consts::PI * frequency * frame as f64 / f64::from(sample_rate);
            let sample = (AMPLITUDE * angle.sin()) as i16;
            writer
                .write_sample(sample)
                .map_err(|e| NarrationError::EncodingError(e.to_string()))?;
        }

        writer
            .finalize()
            .map_err(|e| NarrationError::EncodingError(e.to_string()))
    }
}

#[async_trait]
impl NarratorPort for SineWaveNarrator {
    async fn synthesize(
        &self,
        text: &str,
        output_path: &Path,
    ) -> Result<PathBuf, NarrationError> {
        if let Some(parent) = output_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| NarrationError::IoError(e.to_string()))?;
        }

        let text = text.to_string();
        let path = output_path.to_path_buf();
        let sample_rate = self.config.sample_rate;

        let result_path = path.clone();
        tokio::task::spawn_blocking(move || Self::render(&text, &path, sample_rate))
            .await
            .map_err(|e| NarrationError::EncodingError(format!("Render task failed: {}", e)))??;

        tracing::debug!(path = %result_path.display(), "Narration artifact written");
        Ok(result_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn synthesize_to(dir: &TempDir, name: &str, text: &str) -> PathBuf {
        let narrator = SineWaveNarrator::with_defaults();
        narrator
            .synthesize(text, &dir.path().join(name))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_short_text_clamped_to_min_duration() {
        let dir = TempDir::new().unwrap();
        let path = synthesize_to(&dir, "short.wav", "Hi").await;

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, SampleFormat::Int);
        // 2 字符 / 25 < 2 秒下限
        assert_eq!(reader.len(), 2 * 22050);
    }

    #[tokio::test]
    async fn test_duration_scales_with_text_length() {
        let dir = TempDir::new().unwrap();
        // 100 字符 / 25 = 4 秒
        let text = "a".repeat(100);
        let path = synthesize_to(&dir, "scaled.wav", &text).await;

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.len(), 4 * 22050);
    }

    #[tokio::test]
    async fn test_same_text_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let first = synthesize_to(&dir, "a.wav", "Hello world").await;
        let second = synthesize_to(&dir, "b.wav", "Hello world").await;

        let a = std::fs::read(first).unwrap();
        let b = std::fs::read(second).unwrap();
        assert!(!a.is_empty());
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_empty_text_uses_fallback() {
        let dir = TempDir::new().unwrap();
        let empty = synthesize_to(&dir, "empty.wav", "").await;
        let fallback = synthesize_to(&dir, "fallback.wav", FALLBACK_TEXT).await;

        assert_eq!(
            std::fs::read(empty).unwrap(),
            std::fs::read(fallback).unwrap()
        );
    }

    #[tokio::test]
    async fn test_creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b/out.wav");
        let narrator = SineWaveNarrator::with_defaults();
        let path = narrator.synthesize("nested", &nested).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_samples_not_silent() {
        let dir = TempDir::new().unwrap();
        let path = synthesize_to(&dir, "loud.wav", "Hello world").await;

        let mut reader = hound::WavReader::open(&path).unwrap();
        let peak = reader
            .samples::<i16>()
            .map(|s| s.unwrap().unsigned_abs())
            .max()
            .unwrap();
        assert!(peak > 10_000, "peak amplitude too low: {}", peak);
    }
}
