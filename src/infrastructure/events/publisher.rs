//! Event Publisher Implementation
//!
//! WebSocket 事件推送实现。生成任务进度和歌曲库变更对所有
//! 连接的客户端可见，因此只使用全局广播通道。

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::application::ports::TaskState;

/// WebSocket 事件类型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum WsEvent {
    /// 生成任务状态变更
    GenerationStateChanged {
        task_id: String,
        title: String,
        state: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_ms: Option<u64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// 生成进度更新（0-100，附引擎状态行）
    GenerationProgress {
        task_id: String,
        title: String,
        progress: u8,
        #[serde(skip_serializing_if = "Option::is_none")]
        status_line: Option<String>,
    },
    /// 歌曲已删除
    SongDeleted { title: String },
    /// 封面已更新
    CoverUpdated { title: String },
}

/// 事件发布器
pub struct EventPublisher {
    channel: broadcast::Sender<WsEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(100);
        Self { channel: tx }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅事件流
    pub fn subscribe(&self) -> broadcast::Receiver<WsEvent> {
        self.channel.subscribe()
    }

    /// 发布任务开始生成事件
    pub fn publish_generation_running(&self, task_id: &str, title: &str) {
        self.publish(WsEvent::GenerationStateChanged {
            task_id: task_id.to_string(),
            title: title.to_string(),
            state: TaskState::Running.as_str().to_string(),
            duration_ms: None,
            error: None,
        });
    }

    /// 发布进度更新事件
    pub fn publish_generation_progress(
        &self,
        task_id: &str,
        title: &str,
        progress: u8,
        status_line: Option<&str>,
    ) {
        self.publish(WsEvent::GenerationProgress {
            task_id: task_id.to_string(),
            title: title.to_string(),
            progress,
            status_line: status_line.map(|s| s.to_string()),
        });
    }

    /// 发布生成完成事件
    pub fn publish_generation_ready(&self, task_id: &str, title: &str, duration_ms: Option<u64>) {
        self.publish(WsEvent::GenerationStateChanged {
            task_id: task_id.to_string(),
            title: title.to_string(),
            state: TaskState::Ready.as_str().to_string(),
            duration_ms,
            error: None,
        });
    }

    /// 发布生成失败事件
    pub fn publish_generation_failed(&self, task_id: &str, title: &str, error: &str) {
        self.publish(WsEvent::GenerationStateChanged {
            task_id: task_id.to_string(),
            title: title.to_string(),
            state: TaskState::Failed.as_str().to_string(),
            duration_ms: None,
            error: Some(error.to_string()),
        });
    }

    /// 发布生成取消事件
    pub fn publish_generation_cancelled(&self, task_id: &str, title: &str) {
        self.publish(WsEvent::GenerationStateChanged {
            task_id: task_id.to_string(),
            title: title.to_string(),
            state: TaskState::Cancelled.as_str().to_string(),
            duration_ms: None,
            error: None,
        });
    }

    /// 发布歌曲删除事件
    pub fn publish_song_deleted(&self, title: &str) {
        self.publish(WsEvent::SongDeleted {
            title: title.to_string(),
        });
    }

    /// 发布封面更新事件
    pub fn publish_cover_updated(&self, title: &str) {
        self.publish(WsEvent::CoverUpdated {
            title: title.to_string(),
        });
    }

    fn publish(&self, event: WsEvent) {
        if let Err(e) = self.channel.send(event) {
            tracing::debug!(error = %e, "Failed to publish event (no receivers)");
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_progress_events() {
        let publisher = EventPublisher::new();
        let mut rx = publisher.subscribe();

        publisher.publish_generation_progress("task-1", "Untitled_1", 42, Some("step 21/50"));

        match rx.recv().await.unwrap() {
            WsEvent::GenerationProgress {
                task_id,
                progress,
                status_line,
                ..
            } => {
                assert_eq!(task_id, "task-1");
                assert_eq!(progress, 42);
                assert_eq!(status_line.as_deref(), Some("step 21/50"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let publisher = EventPublisher::new();
        // 没有订阅者时发送失败但不 panic
        publisher.publish_song_deleted("Gone");
    }
}
