//! Generation HTTP Handlers - 音乐生成任务

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::application::{
    CancelGenerationCommand, GetTaskStatus, ListActiveTasks, RemixSongCommand,
    SubmitGenerationCommand, TaskStatusResponse,
};
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SubmitGenerationRequest {
    /// 缺省时自动分配 "Untitled_N"
    pub title: Option<String>,
    /// 歌词，空字符串表示纯器乐
    #[serde(default)]
    pub lyrics: String,
    /// 风格描述
    #[serde(default)]
    pub style: String,
    pub topk: Option<u32>,
    pub temperature: Option<f32>,
    pub cfg_scale: Option<f32>,
    pub max_audio_length_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct SubmitGenerationDto {
    pub task_id: String,
    pub title: String,
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct RemixSongRequest {
    pub title: String,
    pub topk: Option<u32>,
    pub temperature: Option<f32>,
    pub cfg_scale: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct CancelGenerationRequest {
    pub task_id: String,
}

#[derive(Debug, Serialize)]
pub struct CancelGenerationDto {
    pub cancelled: bool,
}

#[derive(Debug, Deserialize)]
pub struct GetTaskStatusRequest {
    pub task_id: String,
}

#[derive(Debug, Serialize)]
pub struct TaskStatusDto {
    pub task_id: String,
    pub title: String,
    pub state: String,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<TaskStatusResponse> for TaskStatusDto {
    fn from(t: TaskStatusResponse) -> Self {
        Self {
            task_id: t.task_id,
            title: t.title,
            state: t.state.as_str().to_string(),
            progress: t.progress,
            status_line: t.status_line,
            error: t.error,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// 提交生成任务
pub async fn submit_generation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitGenerationRequest>,
) -> Result<Json<ApiResponse<SubmitGenerationDto>>, ApiError> {
    let cmd = SubmitGenerationCommand {
        title: req.title,
        lyrics: req.lyrics,
        style: req.style,
        topk: req.topk,
        temperature: req.temperature,
        cfg_scale: req.cfg_scale,
        max_audio_length_ms: req.max_audio_length_ms,
    };

    let result = state.submit_generation_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(SubmitGenerationDto {
        task_id: result.task_id,
        title: result.title,
        state: result.state.as_str().to_string(),
    })))
}

/// 以既有歌曲的歌词与风格重新生成
pub async fn remix_song(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RemixSongRequest>,
) -> Result<Json<ApiResponse<SubmitGenerationDto>>, ApiError> {
    let cmd = RemixSongCommand {
        title: req.title,
        topk: req.topk,
        temperature: req.temperature,
        cfg_scale: req.cfg_scale,
    };

    let result = state.remix_song_handler.handle(cmd).await?;

    Ok(Json(ApiResponse::success(SubmitGenerationDto {
        task_id: result.task_id,
        title: result.title,
        state: result.state.as_str().to_string(),
    })))
}

/// 取消生成任务
pub async fn cancel_generation(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CancelGenerationRequest>,
) -> Result<Json<ApiResponse<CancelGenerationDto>>, ApiError> {
    let result = state
        .cancel_generation_handler
        .handle(CancelGenerationCommand {
            task_id: req.task_id,
        });

    Ok(Json(ApiResponse::success(CancelGenerationDto {
        cancelled: result.cancelled,
    })))
}

/// 查询任务状态
pub async fn get_task_status(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GetTaskStatusRequest>,
) -> Result<Json<ApiResponse<TaskStatusDto>>, ApiError> {
    let result = state.get_task_status_handler.handle(GetTaskStatus {
        task_id: req.task_id,
    })?;

    Ok(Json(ApiResponse::success(TaskStatusDto::from(result))))
}

/// 列出进行中的任务
pub async fn list_active_tasks(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<TaskStatusDto>>>, ApiError> {
    let tasks = state.list_active_tasks_handler.handle(ListActiveTasks);

    Ok(Json(ApiResponse::success(
        tasks.into_iter().map(TaskStatusDto::from).collect(),
    )))
}
