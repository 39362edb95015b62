//! Task Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::TaskManagerPort;
use crate::application::queries::task_queries::{GetTaskStatus, ListActiveTasks, TaskStatusResponse};

/// GetTaskStatus Handler - 查询生成任务状态
pub struct GetTaskStatusHandler {
    task_manager: Arc<dyn TaskManagerPort>,
}

impl GetTaskStatusHandler {
    pub fn new(task_manager: Arc<dyn TaskManagerPort>) -> Self {
        Self { task_manager }
    }

    pub fn handle(&self, query: GetTaskStatus) -> Result<TaskStatusResponse, ApplicationError> {
        let task = self
            .task_manager
            .get_task(&query.task_id)
            .ok_or_else(|| ApplicationError::not_found("Task", &query.task_id))?;

        Ok(TaskStatusResponse {
            task_id: task.task_id,
            title: task.title,
            state: task.state,
            progress: task.progress,
            status_line: task.status_line,
            error: task.error_message,
        })
    }
}

/// ListActiveTasks Handler - 列出进行中的任务
pub struct ListActiveTasksHandler {
    task_manager: Arc<dyn TaskManagerPort>,
}

impl ListActiveTasksHandler {
    pub fn new(task_manager: Arc<dyn TaskManagerPort>) -> Self {
        Self { task_manager }
    }

    pub fn handle(&self, _query: ListActiveTasks) -> Vec<TaskStatusResponse> {
        self.task_manager
            .list_active()
            .into_iter()
            .map(|task| TaskStatusResponse {
                task_id: task.task_id,
                title: task.title,
                state: task.state,
                progress: task.progress,
                status_line: task.status_line,
                error: task.error_message,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::GenerationTask;
    use crate::domain::song::{GenParams, Lyrics, StylePrompt};
    use crate::infrastructure::memory::InMemoryTaskManager;
    use std::path::PathBuf;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_engine_status_line_surfaces_in_task_status() {
        let (tx, _rx) = mpsc::channel(100);
        let manager = Arc::new(InMemoryTaskManager::new(tx));

        let task = GenerationTask::new("Status Song".to_string());
        let task_id = task.task_id.clone();
        let request = crate::application::ports::GenerateRequest {
            task_id: task_id.clone(),
            lyrics: Lyrics::new("[verse] hum"),
            style: StylePrompt::new("jazz"),
            params: GenParams::default(),
            output_path: PathBuf::from("output/songs/Status Song.wav"),
        };
        manager.submit(task, request).unwrap();
        manager
            .set_progress(&task_id, 16, Some("step 8/50 generating tokens"))
            .unwrap();

        let handler = GetTaskStatusHandler::new(manager);
        let status = handler.handle(GetTaskStatus { task_id }).unwrap();
        assert_eq!(status.progress, 16);
        assert_eq!(
            status.status_line.as_deref(),
            Some("step 8/50 generating tokens")
        );
    }
}
