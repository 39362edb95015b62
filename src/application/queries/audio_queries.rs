//! Audio Queries - 音频获取查询

use crate::application::ports::PreviewFormat;
use std::path::PathBuf;

/// 获取歌曲原始 WAV（流式下载）
#[derive(Debug, Clone)]
pub struct GetSongAudio {
    pub title: String,
}

/// WAV 下载响应（路径交由 HTTP 层流式发送）
#[derive(Debug, Clone)]
pub struct GetSongAudioResponse {
    pub wav_path: PathBuf,
    pub size_bytes: u64,
}

/// 获取试听音频（转码 + 缓存）
#[derive(Debug, Clone)]
pub struct GetPreview {
    pub title: String,
    /// None 时使用配置默认格式
    pub format: Option<PreviewFormat>,
}

/// 试听音频响应
#[derive(Debug, Clone)]
pub struct GetPreviewResponse {
    pub audio_data: Vec<u8>,
    pub format: PreviewFormat,
    pub content_type: &'static str,
    pub duration_ms: u64,
    pub from_cache: bool,
}
