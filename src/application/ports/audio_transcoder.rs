//! Audio Transcoder Port - 音频转码抽象
//!
//! 定义音频转码的抽象接口，将生成的 WAV 转换为体积更小的试听格式

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 转码错误
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// 试听输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PreviewFormat {
    /// 原始 WAV，不转码
    Wav,
    /// Opus 格式 - 体积小，适合网络试听
    #[default]
    Opus,
}

impl std::fmt::Display for PreviewFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreviewFormat::Wav => write!(f, "wav"),
            PreviewFormat::Opus => write!(f, "opus"),
        }
    }
}

impl std::str::FromStr for PreviewFormat {
    type Err = TranscodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wav" => Ok(PreviewFormat::Wav),
            "opus" => Ok(PreviewFormat::Opus),
            _ => Err(TranscodeError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl PreviewFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            PreviewFormat::Wav => "audio/wav",
            PreviewFormat::Opus => "audio/ogg",
        }
    }
}

/// 转码配置
#[derive(Debug, Clone)]
pub struct TranscodeConfig {
    /// 输出格式
    pub format: PreviewFormat,
    /// 目标比特率（bps），用于有损压缩格式
    /// Opus 音乐推荐: 64000-128000
    pub bitrate: Option<u32>,
    /// 目标声道数，None 保持原始声道数
    pub channels: Option<u8>,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            format: PreviewFormat::Opus,
            bitrate: Some(96_000),
            channels: None,
        }
    }
}

/// 转码结果
#[derive(Debug, Clone)]
pub struct TranscodeResult {
    /// 转码后的音频数据
    pub audio_data: Vec<u8>,
    /// 输出格式
    pub format: PreviewFormat,
    /// 时长（毫秒）
    pub duration_ms: u64,
    /// 采样率
    pub sample_rate: u32,
    /// 声道数
    pub channels: u8,
    /// 原始大小（字节）
    pub original_size: usize,
    /// 转码后大小（字节）
    pub transcoded_size: usize,
}

/// 音频信息
#[derive(Debug, Clone)]
pub struct AudioInfo {
    /// 时长（毫秒）
    pub duration_ms: u64,
    /// 采样率
    pub sample_rate: u32,
    /// 声道数
    pub channels: u8,
    /// 位深度
    pub bits_per_sample: u16,
    /// PCM 数据大小（字节）
    pub data_size: usize,
}

/// Audio Transcoder Port
///
/// 音频转码的抽象接口
#[async_trait]
pub trait AudioTranscoderPort: Send + Sync {
    /// 转码音频
    async fn transcode(
        &self,
        wav_data: &[u8],
        config: &TranscodeConfig,
    ) -> Result<TranscodeResult, TranscodeError>;

    /// 解析 WAV 头获取音频信息（不转码）
    fn get_audio_info(&self, wav_data: &[u8]) -> Result<AudioInfo, TranscodeError>;

    /// 检查是否支持指定格式
    fn supports_format(&self, format: PreviewFormat) -> bool;
}
