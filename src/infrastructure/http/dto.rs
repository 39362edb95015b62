//! Data Transfer Objects

use serde::Serialize;

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }

    /// 错误响应
    #[allow(dead_code)]
    pub fn error(errno: i32, error: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            errno,
            error: error.into(),
            data: None,
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(Empty {}),
        }
    }
}

// ============================================================================
// Song DTOs
// ============================================================================

/// 曲库条目响应
#[derive(Debug, Serialize)]
pub struct SongResponse {
    pub title: String,
    pub lyrics: String,
    pub style: String,
    pub instrumental: bool,
    pub has_cover: bool,
    pub size_bytes: u64,
    pub created_at: String,
    pub modified_at: String,
}

impl From<crate::application::SongRecord> for SongResponse {
    fn from(record: crate::application::SongRecord) -> Self {
        let song = &record.song;
        Self {
            title: song.title().as_str().to_string(),
            lyrics: song.lyrics().as_str().to_string(),
            style: song.style().as_str().to_string(),
            instrumental: song.lyrics().is_instrumental(),
            has_cover: record.cover_path.is_some(),
            size_bytes: record.size_bytes,
            created_at: song.created_at().to_rfc3339(),
            modified_at: record.modified_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Player DTOs
// ============================================================================

/// 播放状态响应
#[derive(Debug, Serialize)]
pub struct PlaybackStatusResponse {
    pub session_id: String,
    pub title: String,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub playing: bool,
    pub finished: bool,
    pub started_at: String,
}

impl From<crate::application::PlaybackStatus> for PlaybackStatusResponse {
    fn from(status: crate::application::PlaybackStatus) -> Self {
        Self {
            session_id: status.session_id,
            title: status.title,
            position_ms: status.snapshot.position_ms,
            duration_ms: status.snapshot.duration_ms,
            playing: status.snapshot.playing,
            finished: status.snapshot.finished,
            started_at: status.started_at.to_rfc3339(),
        }
    }
}
