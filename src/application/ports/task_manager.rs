//! Task Manager Port - 生成任务管理
//!
//! 定义任务管理的抽象接口，具体实现在 infrastructure/memory 层

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Task Manager 错误
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Task already exists: {0}")]
    AlreadyExists(String),

    #[error("Generation already in progress for title: {0}")]
    TitleInFlight(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),
}

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// 等待生成
    Pending,
    /// 正在生成
    Running,
    /// 生成完成
    Ready,
    /// 生成失败
    Failed,
    /// 已取消
    Cancelled,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Ready => "ready",
            TaskState::Failed => "failed",
            TaskState::Cancelled => "cancelled",
        }
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Ready | TaskState::Failed | TaskState::Cancelled
        )
    }
}

/// 生成任务
#[derive(Debug, Clone)]
pub struct GenerationTask {
    pub task_id: String,
    /// 目标歌曲标题（同一标题同时只允许一个进行中的任务）
    pub title: String,
    pub state: TaskState,
    /// 进度百分比 0-100
    pub progress: u8,
    /// 引擎最近输出的状态行（前端进度条文案）
    pub status_line: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Ready 时产出的 WAV 路径
    pub wav_path: Option<PathBuf>,
    pub error_message: Option<String>,
}

impl GenerationTask {
    pub fn new(title: String) -> Self {
        Self {
            task_id: Uuid::new_v4().to_string(),
            title,
            state: TaskState::Pending,
            progress: 0,
            status_line: None,
            created_at: Utc::now(),
            completed_at: None,
            wav_path: None,
            error_message: None,
        }
    }
}

/// Task Manager Port
///
/// 管理生成任务的生命周期，所有状态存储在内存中。
/// 提交的任务经内部队列分发给 GenerationWorker。
pub trait TaskManagerPort: Send + Sync {
    /// 提交任务并入队，同标题已有进行中任务时返回 TitleInFlight
    fn submit(
        &self,
        task: GenerationTask,
        request: super::GenerateRequest,
    ) -> Result<String, TaskError>;

    /// 获取任务
    fn get_task(&self, task_id: &str) -> Option<GenerationTask>;

    /// 获取任务状态
    fn get_state(&self, task_id: &str) -> Option<TaskState>;

    /// 设置任务状态
    fn set_state(&self, task_id: &str, state: TaskState) -> Result<(), TaskError>;

    /// 更新进度（只增不减）与最近一条引擎状态行
    fn set_progress(
        &self,
        task_id: &str,
        progress: u8,
        status_line: Option<&str>,
    ) -> Result<(), TaskError>;

    /// 标记任务完成并记录产出路径
    fn set_ready(&self, task_id: &str, wav_path: PathBuf) -> Result<(), TaskError>;

    /// 标记任务失败并记录错误
    fn set_failed(&self, task_id: &str, error: String) -> Result<(), TaskError>;

    /// 请求取消任务，返回是否取消成功（仅 pending/running 可取消）
    fn cancel(&self, task_id: &str) -> bool;

    /// 检查任务是否已取消
    fn is_cancelled(&self, task_id: &str) -> bool;

    /// 指定标题是否有进行中的任务
    fn is_title_in_flight(&self, title: &str) -> bool;

    /// 列出所有未到终态的任务
    fn list_active(&self) -> Vec<GenerationTask>;

    /// 清理已到终态且超过保留期的任务，返回清理数量
    fn cleanup_finished(&self, keep: chrono::Duration) -> usize;
}
