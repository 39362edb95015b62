//! In-Memory Player Session Manager

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::application::ports::{PlaybackError, PlaybackStatus, PlayerManagerPort};
use crate::domain::PlayerState;

/// 单个会话的播放条目
struct PlaybackEntry {
    title: String,
    state: PlayerState,
    started_at: DateTime<Utc>,
}

/// 内存播放会话管理器
///
/// session_id -> 播放状态机，每会话至多一首
pub struct InMemoryPlayerManager {
    sessions: DashMap<String, PlaybackEntry>,
}

impl InMemoryPlayerManager {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn status_of(entry: &PlaybackEntry, session_id: &str, now: Instant) -> PlaybackStatus {
        PlaybackStatus {
            session_id: session_id.to_string(),
            title: entry.title.clone(),
            snapshot: entry.state.snapshot(now),
            started_at: entry.started_at,
        }
    }
}

impl Default for InMemoryPlayerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerManagerPort for InMemoryPlayerManager {
    fn play(&self, session_id: &str, title: &str, duration: Duration) -> PlaybackStatus {
        let now = Instant::now();
        let entry = PlaybackEntry {
            title: title.to_string(),
            state: PlayerState::start(duration, now),
            started_at: Utc::now(),
        };
        let status = Self::status_of(&entry, session_id, now);
        self.sessions.insert(session_id.to_string(), entry);

        tracing::debug!(
            session_id = %session_id,
            title = %title,
            duration_ms = duration.as_millis() as u64,
            "Playback session started"
        );
        status
    }

    fn pause(&self, session_id: &str) -> Result<PlaybackStatus, PlaybackError> {
        let now = Instant::now();
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| PlaybackError::SessionNotFound(session_id.to_string()))?;
        entry.state.pause(now);
        Ok(Self::status_of(&entry, session_id, now))
    }

    fn resume(&self, session_id: &str) -> Result<PlaybackStatus, PlaybackError> {
        let now = Instant::now();
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| PlaybackError::SessionNotFound(session_id.to_string()))?;
        entry.state.resume(now);
        Ok(Self::status_of(&entry, session_id, now))
    }

    fn seek(&self, session_id: &str, position: Duration) -> Result<PlaybackStatus, PlaybackError> {
        let now = Instant::now();
        let mut entry = self
            .sessions
            .get_mut(session_id)
            .ok_or_else(|| PlaybackError::SessionNotFound(session_id.to_string()))?;
        entry.state.seek(position, now);
        Ok(Self::status_of(&entry, session_id, now))
    }

    fn status(&self, session_id: &str) -> Result<PlaybackStatus, PlaybackError> {
        let now = Instant::now();
        let entry = self
            .sessions
            .get(session_id)
            .ok_or_else(|| PlaybackError::SessionNotFound(session_id.to_string()))?;
        Ok(Self::status_of(&entry, session_id, now))
    }

    fn stop(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_replaces_current_song() {
        let manager = InMemoryPlayerManager::new();
        manager.play("s1", "First", Duration::from_secs(60));
        let status = manager.play("s1", "Second", Duration::from_secs(90));

        assert_eq!(status.title, "Second");
        assert_eq!(manager.session_count(), 1);
    }

    #[test]
    fn test_seek_reports_target_position() {
        let manager = InMemoryPlayerManager::new();
        manager.play("s1", "Song", Duration::from_secs(180));

        let status = manager.seek("s1", Duration::from_secs(120)).unwrap();
        // seek 后上报位置立即为目标值（允许极小的时钟前进量）
        assert!(status.snapshot.position_ms >= 120_000);
        assert!(status.snapshot.position_ms < 121_000);
    }

    #[test]
    fn test_unknown_session_errors() {
        let manager = InMemoryPlayerManager::new();
        assert!(matches!(
            manager.pause("ghost"),
            Err(PlaybackError::SessionNotFound(_))
        ));
        assert!(!manager.stop("ghost"));
    }
}
