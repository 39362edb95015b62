//! Player Command Handlers
//!
//! 服务端播放状态机：报告位置 = seek 基准 + 播放中经过的时间

use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;

use crate::application::commands::player_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AudioTranscoderPort, PlaybackStatus, PlayerManagerPort, SongLibraryPort,
};
use crate::domain::song::SongTitle;

/// WAV 头解析所需的最大读取量
const WAV_HEADER_PROBE_BYTES: u64 = 64 * 1024;

/// Play Handler - 开始播放
pub struct PlayHandler {
    library: Arc<dyn SongLibraryPort>,
    players: Arc<dyn PlayerManagerPort>,
    transcoder: Arc<dyn AudioTranscoderPort>,
}

impl PlayHandler {
    pub fn new(
        library: Arc<dyn SongLibraryPort>,
        players: Arc<dyn PlayerManagerPort>,
        transcoder: Arc<dyn AudioTranscoderPort>,
    ) -> Self {
        Self {
            library,
            players,
            transcoder,
        }
    }

    pub async fn handle(&self, cmd: PlayCommand) -> Result<PlaybackStatus, ApplicationError> {
        let title = SongTitle::new(&cmd.title)?;
        let record = self
            .library
            .get(&title)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Song", &cmd.title))?;

        // 只读 WAV 头，时长从 fmt/data chunk 推导
        let mut file = tokio::fs::File::open(&record.wav_path)
            .await
            .map_err(|e| ApplicationError::StorageError(e.to_string()))?;
        let mut header = Vec::new();
        file.take(WAV_HEADER_PROBE_BYTES)
            .read_to_end(&mut header)
            .await
            .map_err(|e| ApplicationError::StorageError(e.to_string()))?;

        let info = self.transcoder.get_audio_info(&header)?;
        let duration = Duration::from_millis(info.duration_ms);

        let status = self.players.play(&cmd.session_id, title.as_str(), duration);

        tracing::info!(
            session_id = %cmd.session_id,
            title = %title,
            duration_ms = info.duration_ms,
            "Playback started"
        );
        Ok(status)
    }
}

/// Pause Handler - 暂停播放
pub struct PauseHandler {
    players: Arc<dyn PlayerManagerPort>,
}

impl PauseHandler {
    pub fn new(players: Arc<dyn PlayerManagerPort>) -> Self {
        Self { players }
    }

    pub fn handle(&self, cmd: PauseCommand) -> Result<PlaybackStatus, ApplicationError> {
        Ok(self.players.pause(&cmd.session_id)?)
    }
}

/// Resume Handler - 继续播放
pub struct ResumeHandler {
    players: Arc<dyn PlayerManagerPort>,
}

impl ResumeHandler {
    pub fn new(players: Arc<dyn PlayerManagerPort>) -> Self {
        Self { players }
    }

    pub fn handle(&self, cmd: ResumeCommand) -> Result<PlaybackStatus, ApplicationError> {
        Ok(self.players.resume(&cmd.session_id)?)
    }
}

/// Seek Handler - 跳转
///
/// seek 只更新位置基准，上报位置立即反映跳转目标
pub struct SeekHandler {
    players: Arc<dyn PlayerManagerPort>,
}

impl SeekHandler {
    pub fn new(players: Arc<dyn PlayerManagerPort>) -> Self {
        Self { players }
    }

    pub fn handle(&self, cmd: SeekCommand) -> Result<PlaybackStatus, ApplicationError> {
        let status = self
            .players
            .seek(&cmd.session_id, Duration::from_millis(cmd.position_ms))?;

        tracing::debug!(
            session_id = %cmd.session_id,
            position_ms = cmd.position_ms,
            "Seek"
        );
        Ok(status)
    }
}

/// Stop Handler - 停止播放
pub struct StopHandler {
    players: Arc<dyn PlayerManagerPort>,
}

impl StopHandler {
    pub fn new(players: Arc<dyn PlayerManagerPort>) -> Self {
        Self { players }
    }

    pub fn handle(&self, cmd: StopCommand) -> StopResponse {
        StopResponse {
            stopped: self.players.stop(&cmd.session_id),
        }
    }
}
