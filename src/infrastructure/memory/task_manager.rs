//! In-Memory Task Manager Implementation

use chrono::{Duration, Utc};
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::ports::{
    GenerateRequest, GenerationTask, TaskError, TaskManagerPort, TaskState,
};

/// 内存任务管理器
///
/// 任务状态存 DashMap，生成请求经 mpsc 队列分发给 GenerationWorker。
/// title 索引保证同标题同时只有一个未到终态的任务。
pub struct InMemoryTaskManager {
    /// task_id -> GenerationTask
    tasks: DashMap<String, GenerationTask>,
    /// title -> 进行中的 task_id
    in_flight_titles: DashMap<String, String>,
    /// 任务队列发送端
    queue_sender: mpsc::Sender<GenerateRequest>,
}

impl InMemoryTaskManager {
    pub fn new(queue_sender: mpsc::Sender<GenerateRequest>) -> Self {
        Self {
            tasks: DashMap::new(),
            in_flight_titles: DashMap::new(),
            queue_sender,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 任务到达终态时释放 title 占用
    fn release_title(&self, task: &GenerationTask) {
        self.in_flight_titles
            .remove_if(&task.title, |_, id| id == &task.task_id);
    }
}

impl TaskManagerPort for InMemoryTaskManager {
    fn submit(
        &self,
        task: GenerationTask,
        request: GenerateRequest,
    ) -> Result<String, TaskError> {
        let task_id = task.task_id.clone();
        let title = task.title.clone();

        // 占用标题，已被占用则拒绝
        match self.in_flight_titles.entry(title.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                return Err(TaskError::TitleInFlight(title));
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(task_id.clone());
            }
        }

        self.tasks.insert(task_id.clone(), task);

        if let Err(e) = self.queue_sender.try_send(request) {
            tracing::warn!(task_id = %task_id, error = %e, "Failed to enqueue task");
            // 入队失败则回滚，避免标题被永久占用
            if let Some(mut t) = self.tasks.get_mut(&task_id) {
                t.state = TaskState::Failed;
                t.error_message = Some("queue full".to_string());
                t.completed_at = Some(Utc::now());
            }
            self.in_flight_titles.remove(&title);
            return Err(TaskError::InvalidStateTransition(
                "generation queue is full".to_string(),
            ));
        }

        tracing::debug!(task_id = %task_id, title = %title, "Task submitted");
        Ok(task_id)
    }

    fn get_task(&self, task_id: &str) -> Option<GenerationTask> {
        self.tasks.get(task_id).map(|t| t.clone())
    }

    fn get_state(&self, task_id: &str) -> Option<TaskState> {
        self.tasks.get(task_id).map(|t| t.state)
    }

    fn set_state(&self, task_id: &str, state: TaskState) -> Result<(), TaskError> {
        let task = {
            let mut task = self
                .tasks
                .get_mut(task_id)
                .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;

            let old_state = task.state;
            task.state = state;
            if state.is_terminal() {
                task.completed_at = Some(Utc::now());
            }

            tracing::debug!(
                task_id = %task_id,
                old_state = ?old_state,
                new_state = ?state,
                "Task state changed"
            );
            task.clone()
        };

        if state.is_terminal() {
            self.release_title(&task);
        }
        Ok(())
    }

    fn set_progress(
        &self,
        task_id: &str,
        progress: u8,
        status_line: Option<&str>,
    ) -> Result<(), TaskError> {
        let mut task = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;

        // 进度只增不减，封顶 100
        task.progress = task.progress.max(progress.min(100));
        if let Some(line) = status_line {
            task.status_line = Some(line.to_string());
        }
        Ok(())
    }

    fn set_ready(&self, task_id: &str, wav_path: PathBuf) -> Result<(), TaskError> {
        let task = {
            let mut task = self
                .tasks
                .get_mut(task_id)
                .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;

            task.state = TaskState::Ready;
            task.progress = 100;
            task.wav_path = Some(wav_path);
            task.completed_at = Some(Utc::now());
            task.clone()
        };
        self.release_title(&task);
        Ok(())
    }

    fn set_failed(&self, task_id: &str, error: String) -> Result<(), TaskError> {
        let task = {
            let mut task = self
                .tasks
                .get_mut(task_id)
                .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;

            task.state = TaskState::Failed;
            task.error_message = Some(error);
            task.completed_at = Some(Utc::now());
            task.clone()
        };
        self.release_title(&task);
        Ok(())
    }

    fn cancel(&self, task_id: &str) -> bool {
        let task = {
            let Some(mut task) = self.tasks.get_mut(task_id) else {
                return false;
            };
            if task.state.is_terminal() {
                return false;
            }
            task.state = TaskState::Cancelled;
            task.completed_at = Some(Utc::now());
            task.clone()
        };
        self.release_title(&task);
        true
    }

    fn is_cancelled(&self, task_id: &str) -> bool {
        self.tasks
            .get(task_id)
            .map(|t| t.state == TaskState::Cancelled)
            .unwrap_or(true) // 不存在的任务视为已取消
    }

    fn is_title_in_flight(&self, title: &str) -> bool {
        self.in_flight_titles.contains_key(title)
    }

    fn list_active(&self) -> Vec<GenerationTask> {
        self.tasks
            .iter()
            .filter(|t| !t.state.is_terminal())
            .map(|t| t.clone())
            .collect()
    }

    fn cleanup_finished(&self, keep: Duration) -> usize {
        let cutoff = Utc::now() - keep;
        let stale: Vec<String> = self
            .tasks
            .iter()
            .filter(|t| {
                t.state.is_terminal()
                    && t.completed_at.map(|at| at < cutoff).unwrap_or(false)
            })
            .map(|t| t.task_id.clone())
            .collect();

        for task_id in &stale {
            self.tasks.remove(task_id);
        }
        if !stale.is_empty() {
            tracing::debug!(count = stale.len(), "Finished tasks cleaned up");
        }
        stale.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::song::{GenParams, Lyrics, StylePrompt};

    fn sample_request(task_id: &str) -> GenerateRequest {
        GenerateRequest {
            task_id: task_id.to_string(),
            lyrics: Lyrics::new("[verse] la la la"),
            style: StylePrompt::new("rock"),
            params: GenParams::default(),
            output_path: PathBuf::from("output/songs/test.wav"),
        }
    }

    #[tokio::test]
    async fn test_task_lifecycle() {
        let (tx, mut rx) = mpsc::channel(100);
        let manager = InMemoryTaskManager::new(tx);

        let task = GenerationTask::new("Midnight Run".to_string());
        let task_id = task.task_id.clone();

        manager
            .submit(task, sample_request(&task_id))
            .unwrap();

        // 请求已入队
        let queued = rx.try_recv().unwrap();
        assert_eq!(queued.task_id, task_id);

        assert_eq!(manager.get_state(&task_id), Some(TaskState::Pending));
        assert!(manager.is_title_in_flight("Midnight Run"));

        manager.set_state(&task_id, TaskState::Running).unwrap();
        manager.set_progress(&task_id, 30, None).unwrap();
        // 进度不回退
        manager.set_progress(&task_id, 10, None).unwrap();
        assert_eq!(manager.get_task(&task_id).unwrap().progress, 30);

        manager
            .set_ready(&task_id, PathBuf::from("output/songs/Midnight Run.wav"))
            .unwrap();
        let task = manager.get_task(&task_id).unwrap();
        assert_eq!(task.state, TaskState::Ready);
        assert_eq!(task.progress, 100);
        assert!(!manager.is_title_in_flight("Midnight Run"));
    }

    #[tokio::test]
    async fn test_duplicate_title_rejected() {
        let (tx, _rx) = mpsc::channel(100);
        let manager = InMemoryTaskManager::new(tx);

        let first = GenerationTask::new("Same Title".to_string());
        let first_id = first.task_id.clone();
        manager.submit(first, sample_request(&first_id)).unwrap();

        let second = GenerationTask::new("Same Title".to_string());
        let second_id = second.task_id.clone();
        let err = manager.submit(second, sample_request(&second_id));
        assert!(matches!(err, Err(TaskError::TitleInFlight(_))));
    }

    #[tokio::test]
    async fn test_cancel_releases_title() {
        let (tx, _rx) = mpsc::channel(100);
        let manager = InMemoryTaskManager::new(tx);

        let task = GenerationTask::new("Cancel Me".to_string());
        let task_id = task.task_id.clone();
        manager.submit(task, sample_request(&task_id)).unwrap();

        assert!(manager.cancel(&task_id));
        assert!(manager.is_cancelled(&task_id));
        assert!(!manager.is_title_in_flight("Cancel Me"));

        // 终态任务不能再次取消
        assert!(!manager.cancel(&task_id));
    }

    #[tokio::test]
    async fn test_status_line_kept_with_progress() {
        let (tx, _rx) = mpsc::channel(100);
        let manager = InMemoryTaskManager::new(tx);

        let task = GenerationTask::new("With Status".to_string());
        let task_id = task.task_id.clone();
        manager.submit(task, sample_request(&task_id)).unwrap();

        manager
            .set_progress(&task_id, 20, Some("step 10/50"))
            .unwrap();
        // 没有新状态行时保留上一条
        manager.set_progress(&task_id, 22, None).unwrap();

        let task = manager.get_task(&task_id).unwrap();
        assert_eq!(task.progress, 22);
        assert_eq!(task.status_line.as_deref(), Some("step 10/50"));
    }

    #[tokio::test]
    async fn test_cleanup_finished() {
        let (tx, _rx) = mpsc::channel(100);
        let manager = InMemoryTaskManager::new(tx);

        let task = GenerationTask::new("Old".to_string());
        let task_id = task.task_id.clone();
        manager.submit(task, sample_request(&task_id)).unwrap();
        manager.set_failed(&task_id, "boom".to_string()).unwrap();

        // 保留期为零，完成的任务立即可清理
        let removed = manager.cleanup_finished(Duration::zero());
        assert_eq!(removed, 1);
        assert!(manager.get_task(&task_id).is_none());
    }
}
