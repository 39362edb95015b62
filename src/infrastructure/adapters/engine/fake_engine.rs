//! Fake Engine - 用于测试的生成引擎
//!
//! 合成一段正弦波 WAV 并写入目标路径，不实际运行推理脚本

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    EngineError, GenerateOutcome, GenerateRequest, GenerationEnginePort, ProgressSender,
    ProgressUpdate,
};

/// Fake Engine 配置
#[derive(Debug, Clone)]
pub struct FakeEngineConfig {
    /// 产出音频时长（毫秒）
    pub duration_ms: u64,
    /// 采样率
    pub sample_rate: u32,
    /// 每次进度步进之间的延迟
    pub step_delay_ms: u64,
}

impl Default for FakeEngineConfig {
    fn default() -> Self {
        Self {
            duration_ms: 2_000,
            sample_rate: 22_050,
            step_delay_ms: 10,
        }
    }
}

/// Fake Engine
///
/// 用于测试完整的任务流水线（队列、进度、产出、元数据）
pub struct FakeEngine {
    config: FakeEngineConfig,
}

impl FakeEngine {
    pub fn new(config: FakeEngineConfig) -> Self {
        tracing::info!(
            duration_ms = config.duration_ms,
            "FakeEngine initialized"
        );
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeEngineConfig::default())
    }

    /// 合成 440Hz 正弦波的 16-bit mono PCM WAV
    fn synthesize_wav(&self) -> Vec<u8> {
        let sample_rate = self.config.sample_rate;
        let num_samples = (sample_rate as u64 * self.config.duration_ms / 1000) as u32;
        let data_size = num_samples * 2;

        let mut wav = Vec::with_capacity(44 + data_size as usize);
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&(36 + data_size).to_le_bytes());
        wav.extend_from_slice(b"WAVE");
        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
        wav.extend_from_slice(&1u16.to_le_bytes()); // mono
        wav.extend_from_slice(&sample_rate.to_le_bytes());
        wav.extend_from_slice(&(sample_rate * 2).to_le_bytes());
        wav.extend_from_slice(&2u16.to_le_bytes());
        wav.extend_from_slice(&16u16.to_le_bytes());
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&data_size.to_le_bytes());

        for i in 0..num_samples {
            let t = i as f32 / sample_rate as f32;
            let sample = (t * 440.0 * 2.0 * std::f32::consts::PI).sin();
            wav.extend_from_slice(&((sample * i16::MAX as f32 * 0.3) as i16).to_le_bytes());
        }
        wav
    }
}

#[async_trait]
impl GenerationEnginePort for FakeEngine {
    async fn generate(
        &self,
        request: GenerateRequest,
        progress: ProgressSender,
        cancel: CancellationToken,
    ) -> Result<GenerateOutcome, EngineError> {
        tracing::debug!(
            task_id = %request.task_id,
            lyrics_words = request.lyrics.word_count(),
            style = %request.style,
            "FakeEngine: synthesizing audio"
        );

        // 分步模拟生成进度
        for percent in (10u8..=100).step_by(10) {
            tokio::select! {
                _ = tokio::time::sleep(tokio::time::Duration::from_millis(self.config.step_delay_ms)) => {
                    let _ = progress.send(ProgressUpdate {
                        percent,
                        status_line: Some(format!("generating {}%", percent)),
                    });
                }
                _ = cancel.cancelled() => return Err(EngineError::Cancelled),
            }
        }

        if let Some(dir) = request.output_path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| EngineError::IoError(e.to_string()))?;
        }
        tokio::fs::write(&request.output_path, self.synthesize_wav())
            .await
            .map_err(|e| EngineError::IoError(e.to_string()))?;

        Ok(GenerateOutcome {
            wav_path: request.output_path,
            duration_ms: Some(self.config.duration_ms),
        })
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::song::{GenParams, Lyrics, StylePrompt};
    use tempfile::tempdir;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_fake_engine_writes_wav_and_reports_progress() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("songs").join("Test.wav");
        let engine = FakeEngine::with_defaults();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let outcome = engine
            .generate(
                GenerateRequest {
                    task_id: "t1".to_string(),
                    lyrics: Lyrics::new("la la"),
                    style: StylePrompt::new("test"),
                    params: GenParams::default(),
                    output_path: output.clone(),
                },
                tx,
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.wav_path, output);
        let data = std::fs::read(&output).unwrap();
        assert_eq!(&data[..4], b"RIFF");

        let mut last = 0;
        while let Ok(update) = rx.try_recv() {
            assert!(update.percent >= last);
            assert!(update.status_line.is_some());
            last = update.percent;
        }
        assert_eq!(last, 100);
    }

    #[tokio::test]
    async fn test_fake_engine_cancel() {
        let dir = tempdir().unwrap();
        let engine = FakeEngine::new(FakeEngineConfig {
            step_delay_ms: 50,
            ..Default::default()
        });
        let (tx, _rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = engine
            .generate(
                GenerateRequest {
                    task_id: "t2".to_string(),
                    lyrics: Lyrics::default(),
                    style: StylePrompt::default(),
                    params: GenParams::default(),
                    output_path: dir.path().join("never.wav"),
                },
                tx,
                cancel,
            )
            .await;
        assert!(matches!(result, Err(EngineError::Cancelled)));
    }
}
