//! Generation Engine Port - 音乐生成引擎抽象
//!
//! 定义音乐生成的抽象接口，具体实现在 infrastructure/adapters 层

use crate::domain::song::{GenParams, Lyrics, StylePrompt};
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// 生成引擎错误
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to spawn engine process: {0}")]
    SpawnError(String),

    #[error("Engine process failed (exit code {code:?}): {stderr}")]
    ProcessFailed { code: Option<i32>, stderr: String },

    #[error("Engine produced no output file")]
    OutputMissing,

    #[error("Generation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(String),
}

/// 生成请求
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// 任务 ID（用于日志和追踪）
    pub task_id: String,
    /// 歌词（含结构标签）
    pub lyrics: Lyrics,
    /// 风格提示词
    pub style: StylePrompt,
    /// 采样参数
    pub params: GenParams,
    /// 期望的输出 WAV 路径
    pub output_path: PathBuf,
}

/// 生成结果
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    /// 实际产出的 WAV 路径
    pub wav_path: PathBuf,
    /// 音频时长（毫秒），引擎未报告时为 None
    pub duration_ms: Option<u64>,
}

/// 进度上报
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// 进度百分比 0-100
    pub percent: u8,
    /// 引擎输出的状态行（前端进度条文案）
    pub status_line: Option<String>,
}

/// 进度上报通道
pub type ProgressSender = tokio::sync::mpsc::UnboundedSender<ProgressUpdate>;

/// Generation Engine Port
///
/// 音乐生成引擎的抽象接口。生成过程可能持续数分钟，
/// 实现方通过 progress 通道上报进度百分比，
/// cancel 触发时终止底层进程并返回 Cancelled。
#[async_trait]
pub trait GenerationEnginePort: Send + Sync {
    /// 执行一次音乐生成
    async fn generate(
        &self,
        request: GenerateRequest,
        progress: ProgressSender,
        cancel: tokio_util::sync::CancellationToken,
    ) -> Result<GenerateOutcome, EngineError>;

    /// 检查引擎是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
