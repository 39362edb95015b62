//! 播放位置状态机
//!
//! 原 GUI 的进度计算以 "距上次 play() 调用的时间" 为位置，手动 seek 后
//! 计数器从零重新计起，进度条被重置而播放位置正确。这里重新设计:
//! 位置 = base_offset + 播放中经过的时间，seek 只更新 base_offset，
//! 上报位置永远与实际播放位置一致。
//!
//! 不变量:
//! - 播放中位置单调递增，且不超过曲目时长
//! - seek 后立即查询位置返回 seek 目标
//! - pause/resume 往返不改变位置

use serde::Serialize;
use std::time::{Duration, Instant};

/// 播放模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// 播放中，位置 = base_offset + (now - resumed_at)
    Playing { resumed_at: Instant },
    /// 已暂停，位置冻结在 base_offset
    Paused,
}

/// 单曲播放状态
#[derive(Debug, Clone)]
pub struct PlayerState {
    /// 曲目时长
    duration: Duration,
    /// 上次 start/seek/pause 时确定的位置基准
    base_offset: Duration,
    mode: Mode,
}

/// 上报给客户端的位置快照
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSnapshot {
    pub position_ms: u64,
    pub duration_ms: u64,
    pub playing: bool,
    pub finished: bool,
}

impl PlayerState {
    /// 从头开始播放
    pub fn start(duration: Duration, now: Instant) -> Self {
        Self {
            duration,
            base_offset: Duration::ZERO,
            mode: Mode::Playing { resumed_at: now },
        }
    }

    /// 当前位置（钳制在曲目时长内）
    pub fn position(&self, now: Instant) -> Duration {
        let raw = match self.mode {
            Mode::Playing { resumed_at } => {
                self.base_offset + now.saturating_duration_since(resumed_at)
            }
            Mode::Paused => self.base_offset,
        };
        raw.min(self.duration)
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.mode, Mode::Playing { .. })
    }

    /// 曲目是否播放完毕
    pub fn is_finished(&self, now: Instant) -> bool {
        self.position(now) >= self.duration
    }

    /// 暂停: 冻结当前位置为新的基准
    pub fn pause(&mut self, now: Instant) {
        if self.is_playing() {
            self.base_offset = self.position(now);
            self.mode = Mode::Paused;
        }
    }

    /// 恢复播放
    pub fn resume(&mut self, now: Instant) {
        if !self.is_playing() {
            self.mode = Mode::Playing { resumed_at: now };
        }
    }

    /// 跳转到目标位置
    ///
    /// 只更新位置基准，不影响播放/暂停状态。目标超出时长时钳制到时长。
    pub fn seek(&mut self, target: Duration, now: Instant) {
        self.base_offset = target.min(self.duration);
        if let Mode::Playing { ref mut resumed_at } = self.mode {
            *resumed_at = now;
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn snapshot(&self, now: Instant) -> PlayerSnapshot {
        PlayerSnapshot {
            position_ms: self.position(now).as_millis() as u64,
            duration_ms: self.duration.as_millis() as u64,
            playing: self.is_playing(),
            finished: self.is_finished(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECS: fn(u64) -> Duration = Duration::from_secs;

    #[test]
    fn test_position_advances_while_playing() {
        let t0 = Instant::now();
        let state = PlayerState::start(SECS(180), t0);

        assert_eq!(state.position(t0), SECS(0));
        assert_eq!(state.position(t0 + SECS(42)), SECS(42));
        assert!(state.is_playing());
    }

    #[test]
    fn seek_preserves_reported_position() {
        // 原缺陷: seek 后进度显示归零。重设计后必须立即报告 seek 目标。
        let t0 = Instant::now();
        let mut state = PlayerState::start(SECS(180), t0);

        let t1 = t0 + SECS(10);
        state.seek(SECS(120), t1);

        assert_eq!(state.position(t1), SECS(120));
        // 且继续从 seek 目标前进
        assert_eq!(state.position(t1 + SECS(5)), SECS(125));
    }

    #[test]
    fn test_pause_freezes_position() {
        let t0 = Instant::now();
        let mut state = PlayerState::start(SECS(180), t0);

        let t1 = t0 + SECS(30);
        state.pause(t1);
        assert!(!state.is_playing());
        assert_eq!(state.position(t1 + SECS(60)), SECS(30));

        // resume 后从冻结点继续
        let t2 = t1 + SECS(60);
        state.resume(t2);
        assert_eq!(state.position(t2 + SECS(5)), SECS(35));
    }

    #[test]
    fn test_seek_while_paused_keeps_paused() {
        let t0 = Instant::now();
        let mut state = PlayerState::start(SECS(180), t0);
        state.pause(t0 + SECS(10));

        state.seek(SECS(90), t0 + SECS(20));
        assert!(!state.is_playing());
        assert_eq!(state.position(t0 + SECS(99)), SECS(90));
    }

    #[test]
    fn test_position_clamped_to_duration() {
        let t0 = Instant::now();
        let mut state = PlayerState::start(SECS(60), t0);

        assert_eq!(state.position(t0 + SECS(300)), SECS(60));
        assert!(state.is_finished(t0 + SECS(300)));

        // seek 超出时长也被钳制
        state.seek(SECS(500), t0);
        assert_eq!(state.position(t0), SECS(60));
    }

    #[test]
    fn test_snapshot_fields() {
        let t0 = Instant::now();
        let state = PlayerState::start(SECS(60), t0);
        let snap = state.snapshot(t0 + SECS(15));
        assert_eq!(snap.position_ms, 15_000);
        assert_eq!(snap.duration_ms, 60_000);
        assert!(snap.playing);
        assert!(!snap.finished);
    }
}
