//! Player Manager Port - 播放会话管理
//!
//! 定义播放会话管理的抽象接口，具体实现在 infrastructure/memory 层

use crate::domain::PlayerSnapshot;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

/// Player Manager 错误
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Playback session not found: {0}")]
    SessionNotFound(String),

    #[error("Nothing is playing in session: {0}")]
    NothingPlaying(String),
}

/// 播放会话摘要
#[derive(Debug, Clone)]
pub struct PlaybackStatus {
    pub session_id: String,
    /// 当前加载的歌曲标题
    pub title: String,
    pub snapshot: PlayerSnapshot,
    pub started_at: DateTime<Utc>,
}

/// Player Manager Port
///
/// 每个客户端会话持有至多一个播放状态机。
/// 服务端只追踪位置，实际音频解码在客户端完成。
pub trait PlayerManagerPort: Send + Sync {
    /// 开始播放指定歌曲，已有播放时替换
    fn play(&self, session_id: &str, title: &str, duration: Duration) -> PlaybackStatus;

    /// 暂停
    fn pause(&self, session_id: &str) -> Result<PlaybackStatus, PlaybackError>;

    /// 继续播放
    fn resume(&self, session_id: &str) -> Result<PlaybackStatus, PlaybackError>;

    /// 跳转到指定位置
    fn seek(&self, session_id: &str, position: Duration) -> Result<PlaybackStatus, PlaybackError>;

    /// 当前播放状态
    fn status(&self, session_id: &str) -> Result<PlaybackStatus, PlaybackError>;

    /// 停止并移除会话
    fn stop(&self, session_id: &str) -> bool;

    /// 活跃会话数量
    fn session_count(&self) -> usize;
}
