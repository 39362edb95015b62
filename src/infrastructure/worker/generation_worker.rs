//! Generation Worker - Background Music Task Processor

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    CoverArtPort, EngineError, GenerateRequest, GenerationEnginePort, ProgressUpdate,
    SongLibraryPort, TaskManagerPort, TaskState,
};
use crate::domain::song::{GenParams, Lyrics, Song, SongTitle, StylePrompt};
use crate::infrastructure::events::EventPublisher;

/// Worker 配置
#[derive(Debug, Clone)]
pub struct GenerationWorkerConfig {
    /// 最大并发生成数
    pub max_concurrent: usize,
    /// 取消标志轮询间隔
    pub cancel_poll_interval: Duration,
}

impl Default for GenerationWorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 1,
            cancel_poll_interval: Duration::from_millis(250),
        }
    }
}

/// 周期清理已到终态且超过保留期的任务
pub fn spawn_task_cleanup(
    task_manager: Arc<dyn TaskManagerPort>,
    interval: Duration,
    retention: chrono::Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // interval 的第一拍立即触发，跳过
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = task_manager.cleanup_finished(retention);
            if removed > 0 {
                tracing::info!(count = removed, "Cleaned up finished generation tasks");
            }
        }
    })
}

/// 生成 Worker
///
/// 后台任务处理器，从队列消费生成请求并驱动引擎：
/// 进度透传到任务状态与 WebSocket 事件，
/// 成功后为没有封面的歌曲补一张渐变封面。
pub struct GenerationWorker {
    config: GenerationWorkerConfig,
    queue_receiver: mpsc::Receiver<GenerateRequest>,
    task_manager: Arc<dyn TaskManagerPort>,
    engine: Arc<dyn GenerationEnginePort>,
    library: Arc<dyn SongLibraryPort>,
    cover_art: Arc<dyn CoverArtPort>,
    event_publisher: Arc<EventPublisher>,
}

impl GenerationWorker {
    pub fn new(
        config: GenerationWorkerConfig,
        queue_receiver: mpsc::Receiver<GenerateRequest>,
        task_manager: Arc<dyn TaskManagerPort>,
        engine: Arc<dyn GenerationEnginePort>,
        library: Arc<dyn SongLibraryPort>,
        cover_art: Arc<dyn CoverArtPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            config,
            queue_receiver,
            task_manager,
            engine,
            library,
            cover_art,
            event_publisher,
        }
    }

    /// 启动 Worker
    pub async fn run(mut self) {
        tracing::info!(
            max_concurrent = self.config.max_concurrent,
            "GenerationWorker started"
        );

        // 使用 semaphore 控制并发
        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.config.max_concurrent));

        while let Some(request) = self.queue_receiver.recv().await {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(p) => p,
                Err(_) => {
                    tracing::error!("Failed to acquire semaphore permit");
                    continue;
                }
            };

            let task_manager = self.task_manager.clone();
            let engine = self.engine.clone();
            let library = self.library.clone();
            let cover_art = self.cover_art.clone();
            let event_publisher = self.event_publisher.clone();
            let poll_interval = self.config.cancel_poll_interval;

            tokio::spawn(async move {
                let _permit = permit; // 持有 permit 直到任务完成

                Self::process_request(
                    request,
                    task_manager,
                    engine,
                    library,
                    cover_art,
                    event_publisher,
                    poll_interval,
                )
                .await;
            });
        }

        tracing::info!("GenerationWorker stopped");
    }

    /// 处理单个生成请求
    async fn process_request(
        request: GenerateRequest,
        task_manager: Arc<dyn TaskManagerPort>,
        engine: Arc<dyn GenerationEnginePort>,
        library: Arc<dyn SongLibraryPort>,
        cover_art: Arc<dyn CoverArtPort>,
        event_publisher: Arc<EventPublisher>,
        poll_interval: Duration,
    ) {
        let task_id = request.task_id.clone();

        let task = match task_manager.get_task(&task_id) {
            Some(t) => t,
            None => {
                tracing::warn!(task_id = %task_id, "Task not found, skipping");
                return;
            }
        };
        let title = task.title.clone();

        // 排队期间被取消的任务直接丢弃
        if task_manager.is_cancelled(&task_id) {
            tracing::debug!(task_id = %task_id, "Task cancelled while queued, skipping");
            return;
        }

        if let Err(e) = task_manager.set_state(&task_id, TaskState::Running) {
            tracing::error!(task_id = %task_id, error = %e, "Failed to update task state");
            return;
        }
        event_publisher.publish_generation_running(&task_id, &title);

        // 进度透传：引擎百分比 + 状态行 → 任务状态 + WebSocket 事件
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel::<ProgressUpdate>();
        let progress_forwarder = {
            let task_manager = task_manager.clone();
            let event_publisher = event_publisher.clone();
            let task_id = task_id.clone();
            let title = title.clone();
            tokio::spawn(async move {
                while let Some(update) = progress_rx.recv().await {
                    let _ = task_manager.set_progress(
                        &task_id,
                        update.percent,
                        update.status_line.as_deref(),
                    );
                    event_publisher.publish_generation_progress(
                        &task_id,
                        &title,
                        update.percent,
                        update.status_line.as_deref(),
                    );
                }
            })
        };

        // 轮询取消标志，命中时触发引擎的 CancellationToken
        let cancel_token = CancellationToken::new();
        let cancel_watcher = {
            let task_manager = task_manager.clone();
            let token = cancel_token.clone();
            let task_id = task_id.clone();
            tokio::spawn(async move {
                loop {
                    if task_manager.is_cancelled(&task_id) {
                        token.cancel();
                        break;
                    }
                    tokio::time::sleep(poll_interval).await;
                }
            })
        };

        // 成功后写元数据 sidecar 需要的字段
        let lyrics = request.lyrics.clone();
        let style = request.style.clone();
        let params = request.params.clone();

        let result = engine
            .generate(request, progress_tx, cancel_token.clone())
            .await;

        cancel_watcher.abort();
        let _ = progress_forwarder.await;

        match result {
            Ok(outcome) => {
                Self::persist_metadata(&library, &title, lyrics, style, params).await;
                Self::ensure_cover(&library, &cover_art, &title).await;

                if let Err(e) = task_manager.set_ready(&task_id, outcome.wav_path.clone()) {
                    tracing::error!(task_id = %task_id, error = %e, "Failed to mark task ready");
                    return;
                }
                event_publisher.publish_generation_ready(&task_id, &title, outcome.duration_ms);

                tracing::info!(
                    task_id = %task_id,
                    title = %title,
                    wav_path = %outcome.wav_path.display(),
                    duration_ms = ?outcome.duration_ms,
                    "Generation completed"
                );
            }
            Err(EngineError::Cancelled) => {
                // cancel() 已把状态置为 Cancelled，这里只负责广播
                event_publisher.publish_generation_cancelled(&task_id, &title);
                tracing::info!(task_id = %task_id, title = %title, "Generation cancelled");
            }
            Err(e) => {
                tracing::error!(task_id = %task_id, error = %e, "Generation failed");
                let _ = task_manager.set_failed(&task_id, e.to_string());
                event_publisher.publish_generation_failed(&task_id, &title, &e.to_string());
            }
        }
    }

    /// 生成成功后写元数据 sidecar；失败/取消的任务不留元数据
    async fn persist_metadata(
        library: &Arc<dyn SongLibraryPort>,
        title: &str,
        lyrics: Lyrics,
        style: StylePrompt,
        params: GenParams,
    ) {
        let song = match SongTitle::new(title).and_then(|t| Song::new(t, lyrics, style, params)) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(title = %title, error = %e, "Invalid song data, skipping metadata");
                return;
            }
        };
        if let Err(e) = library.save_metadata(&song).await {
            tracing::warn!(title = %title, error = %e, "Failed to save metadata");
        }
    }

    /// 没有封面的歌补一张渐变封面，并写回元数据
    async fn ensure_cover(
        library: &Arc<dyn SongLibraryPort>,
        cover_art: &Arc<dyn CoverArtPort>,
        title: &str,
    ) {
        let song_title = match SongTitle::new(title) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(title = %title, error = %e, "Invalid title, skipping cover");
                return;
            }
        };

        if library.cover_path(&song_title).exists() {
            return;
        }

        let png = match cover_art.generate_gradient(title) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(title = %title, error = %e, "Cover generation failed");
                return;
            }
        };

        let cover_path = match library.save_cover(&song_title, &png).await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(title = %title, error = %e, "Failed to save cover");
                return;
            }
        };

        // 元数据存在时写回封面路径
        if let Ok(Some(record)) = library.get(&song_title).await {
            let mut song = record.song;
            song.set_cover(cover_path);
            if let Err(e) = library.save_metadata(&song).await {
                tracing::warn!(title = %title, error = %e, "Failed to update metadata");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{GenerateOutcome, GenerationTask, ProgressSender};
    use crate::infrastructure::adapters::covers::CoverRenderer;
    use crate::infrastructure::adapters::engine::FakeEngine;
    use crate::infrastructure::adapters::library::FileSongLibrary;
    use crate::infrastructure::memory::InMemoryTaskManager;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use tempfile::tempdir;

    struct ExplodingEngine;

    #[async_trait]
    impl GenerationEnginePort for ExplodingEngine {
        async fn generate(
            &self,
            _request: GenerateRequest,
            _progress: ProgressSender,
            _cancel: CancellationToken,
        ) -> Result<GenerateOutcome, EngineError> {
            Err(EngineError::ProcessFailed {
                code: Some(1),
                stderr: "CUDA out of memory".to_string(),
            })
        }
    }

    async fn run_once(
        engine: Arc<dyn GenerationEnginePort>,
        library: Arc<FileSongLibrary>,
        title: &str,
    ) -> (Arc<InMemoryTaskManager>, String) {
        let (tx, _rx) = mpsc::channel(100);
        let task_manager = Arc::new(InMemoryTaskManager::new(tx));

        let task = GenerationTask::new(title.to_string());
        let task_id = task.task_id.clone();
        let song_title = SongTitle::new(title).unwrap();
        let request = GenerateRequest {
            task_id: task_id.clone(),
            lyrics: Lyrics::new("[verse] under neon skies"),
            style: StylePrompt::new("synthwave"),
            params: GenParams::default(),
            output_path: library.wav_path(&song_title),
        };
        task_manager.submit(task, request.clone()).unwrap();

        GenerationWorker::process_request(
            request,
            task_manager.clone() as Arc<dyn TaskManagerPort>,
            engine,
            library.clone() as Arc<dyn SongLibraryPort>,
            Arc::new(CoverRenderer::new()) as Arc<dyn CoverArtPort>,
            Arc::new(crate::infrastructure::events::EventPublisher::new()),
            Duration::from_millis(10),
        )
        .await;

        (task_manager, task_id)
    }

    #[tokio::test]
    async fn test_success_writes_metadata_and_cover() {
        let dir = tempdir().unwrap();
        let library = Arc::new(FileSongLibrary::new(dir.path()).await.unwrap());
        let title = SongTitle::new("Worker Song").unwrap();

        let (task_manager, task_id) = run_once(
            Arc::new(FakeEngine::with_defaults()),
            library.clone(),
            "Worker Song",
        )
        .await;

        let task = task_manager.get_task(&task_id).unwrap();
        assert_eq!(task.state, TaskState::Ready);
        assert!(library.wav_path(&title).exists());
        assert!(library.cover_path(&title).exists());

        let record = library.get(&title).await.unwrap().unwrap();
        assert_eq!(record.song.style().as_str(), "synthwave");
        assert!(record.song.cover_path().is_some());
    }

    #[tokio::test]
    async fn test_failure_leaves_no_metadata_sidecar() {
        let dir = tempdir().unwrap();
        let library = Arc::new(FileSongLibrary::new(dir.path()).await.unwrap());

        let (task_manager, task_id) =
            run_once(Arc::new(ExplodingEngine), library.clone(), "Doomed Song").await;

        let task = task_manager.get_task(&task_id).unwrap();
        assert_eq!(task.state, TaskState::Failed);
        assert!(task
            .error_message
            .as_deref()
            .unwrap_or_default()
            .contains("CUDA"));

        let sidecar = dir
            .path()
            .join("metadata")
            .join(SongTitle::new("Doomed Song").unwrap().metadata_name());
        assert!(!sidecar.exists());
    }

    #[tokio::test]
    async fn test_task_cleanup_removes_stale_finished_tasks() {
        let (tx, _rx) = mpsc::channel(100);
        let task_manager = Arc::new(InMemoryTaskManager::new(tx));

        let task = GenerationTask::new("Old Task".to_string());
        let task_id = task.task_id.clone();
        let request = GenerateRequest {
            task_id: task_id.clone(),
            lyrics: Lyrics::default(),
            style: StylePrompt::default(),
            params: GenParams::default(),
            output_path: PathBuf::from("output/songs/Old Task.wav"),
        };
        task_manager.submit(task, request).unwrap();
        task_manager.set_failed(&task_id, "boom".to_string()).unwrap();

        let handle = spawn_task_cleanup(
            task_manager.clone() as Arc<dyn TaskManagerPort>,
            Duration::from_millis(10),
            chrono::Duration::zero(),
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.abort();

        assert!(task_manager.get_task(&task_id).is_none());
    }
}
