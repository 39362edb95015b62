//! Player HTTP Handlers - 播放位置追踪
//!
//! 服务端只维护位置基准，音频数据由客户端通过 audio/preview 接口拉取

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{PauseCommand, PlayCommand, ResumeCommand, SeekCommand, StopCommand};
use crate::infrastructure::http::dto::{ApiResponse, PlaybackStatusResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PlayRequest {
    /// 缺省时服务端分配新会话
    pub session_id: Option<String>,
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    pub session_id: String,
    pub position_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct StopDto {
    pub stopped: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// 开始播放
pub async fn play(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlayRequest>,
) -> Result<Json<ApiResponse<PlaybackStatusResponse>>, ApiError> {
    let session_id = req
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let status = state
        .play_handler
        .handle(PlayCommand {
            session_id,
            title: req.title,
        })
        .await?;

    Ok(Json(ApiResponse::success(status.into())))
}

/// 暂停
pub async fn pause(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<ApiResponse<PlaybackStatusResponse>>, ApiError> {
    let status = state.pause_handler.handle(PauseCommand {
        session_id: req.session_id,
    })?;

    Ok(Json(ApiResponse::success(status.into())))
}

/// 继续播放
pub async fn resume(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<ApiResponse<PlaybackStatusResponse>>, ApiError> {
    let status = state.resume_handler.handle(ResumeCommand {
        session_id: req.session_id,
    })?;

    Ok(Json(ApiResponse::success(status.into())))
}

/// 跳转位置
pub async fn seek(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SeekRequest>,
) -> Result<Json<ApiResponse<PlaybackStatusResponse>>, ApiError> {
    let status = state.seek_handler.handle(SeekCommand {
        session_id: req.session_id,
        position_ms: req.position_ms,
    })?;

    Ok(Json(ApiResponse::success(status.into())))
}

/// 查询播放状态
pub async fn player_status(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<ApiResponse<PlaybackStatusResponse>>, ApiError> {
    let status = state
        .players
        .status(&req.session_id)
        .map_err(crate::application::ApplicationError::from)
        .map_err(ApiError::from)?;

    Ok(Json(ApiResponse::success(status.into())))
}

/// 停止播放
pub async fn stop(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SessionRequest>,
) -> Result<Json<ApiResponse<StopDto>>, ApiError> {
    let result = state.stop_handler.handle(StopCommand {
        session_id: req.session_id,
    });

    Ok(Json(ApiResponse::success(StopDto {
        stopped: result.stopped,
    })))
}
