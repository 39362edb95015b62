//! Task Queries - 生成任务状态查询

use crate::application::ports::TaskState;

/// 查询任务状态
#[derive(Debug, Clone)]
pub struct GetTaskStatus {
    pub task_id: String,
}

/// 任务状态响应
#[derive(Debug, Clone)]
pub struct TaskStatusResponse {
    pub task_id: String,
    pub title: String,
    pub state: TaskState,
    /// 进度百分比 0-100
    pub progress: u8,
    /// 引擎最近输出的状态行
    pub status_line: Option<String>,
    pub error: Option<String>,
}

/// 列出所有未到终态的任务
#[derive(Debug, Clone, Default)]
pub struct ListActiveTasks;
