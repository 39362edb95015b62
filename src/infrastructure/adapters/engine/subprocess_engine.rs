//! Subprocess Engine - HeartMuLa 推理脚本子进程适配器
//!
//! 以子进程方式运行 Python 推理脚本:
//! - 歌词/风格描述写入 assets/lyrics.txt、assets/tags.txt 后以参数传递
//! - 进度从 stdout 行启发式推断（出现 step/generating/progress 时 +2%）
//! - 退出码 0 但目标文件缺失时，回退到输出目录中最新的 WAV

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::fs;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    EngineError, GenerateOutcome, GenerateRequest, GenerationEnginePort, ProgressSender,
    ProgressUpdate,
};

/// stderr 保留的末尾行数（错误报告用）
const STDERR_TAIL_LINES: usize = 20;

/// 进度启发式关键词
const PROGRESS_KEYWORDS: &[&str] = &["step", "generating", "progress"];

/// HeartMuLa 子进程引擎
pub struct SubprocessEngine {
    python: String,
    script: PathBuf,
    assets_dir: PathBuf,
}

impl SubprocessEngine {
    pub fn new(python: impl Into<String>, script: PathBuf, assets_dir: PathBuf) -> Self {
        Self {
            python: python.into(),
            script,
            assets_dir,
        }
    }

    /// 歌词/风格写入引擎输入文件，返回附加的 CLI 参数
    async fn write_inputs(&self, request: &GenerateRequest) -> Result<Vec<String>, EngineError> {
        fs::create_dir_all(&self.assets_dir)
            .await
            .map_err(|e| EngineError::IoError(e.to_string()))?;

        let mut args = Vec::new();

        if !request.lyrics.is_instrumental() {
            let lyrics_path = self.assets_dir.join("lyrics.txt");
            fs::write(&lyrics_path, request.lyrics.as_str())
                .await
                .map_err(|e| EngineError::IoError(e.to_string()))?;
            args.push(format!("--lyrics={}", lyrics_path.display()));
        }

        if !request.style.is_empty() {
            let tags_path = self.assets_dir.join("tags.txt");
            fs::write(&tags_path, request.style.as_str())
                .await
                .map_err(|e| EngineError::IoError(e.to_string()))?;
            args.push(format!("--tags={}", tags_path.display()));
        }

        Ok(args)
    }

    fn build_command(&self, request: &GenerateRequest, input_args: &[String]) -> Command {
        let params = &request.params;
        let mut cmd = Command::new(&self.python);
        cmd.arg(&self.script)
            .arg(format!("--model_path={}", params.model_path.display()))
            .arg(format!("--version={}", params.version))
            .arg(format!("--save_path={}", request.output_path.display()))
            .arg(format!("--topk={}", params.topk))
            .arg(format!("--temperature={}", params.temperature))
            .arg(format!("--cfg_scale={}", params.cfg_scale))
            .arg(format!("--max_audio_length_ms={}", params.max_audio_length_ms))
            .args(input_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// 目标文件缺失时回退到输出目录中最新的 WAV
    async fn resolve_output(&self, expected: &Path) -> Result<PathBuf, EngineError> {
        if expected.exists() {
            return Ok(expected.to_path_buf());
        }

        let Some(dir) = expected.parent() else {
            return Err(EngineError::OutputMissing);
        };

        let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
        let mut entries = fs::read_dir(dir)
            .await
            .map_err(|e| EngineError::IoError(e.to_string()))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| EngineError::IoError(e.to_string()))?
        {
            let path = entry.path();
            if !path.extension().map_or(false, |ext| ext == "wav") {
                continue;
            }
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            let Ok(mtime) = meta.modified() else {
                continue;
            };
            if newest.as_ref().map_or(true, |(t, _)| mtime > *t) {
                newest = Some((mtime, path));
            }
        }

        match newest {
            Some((_, path)) => {
                tracing::warn!(
                    expected = %expected.display(),
                    actual = %path.display(),
                    "Engine wrote to a different path, using newest wav"
                );
                Ok(path)
            }
            None => Err(EngineError::OutputMissing),
        }
    }
}

#[async_trait]
impl GenerationEnginePort for SubprocessEngine {
    async fn generate(
        &self,
        request: GenerateRequest,
        progress: ProgressSender,
        cancel: CancellationToken,
    ) -> Result<GenerateOutcome, EngineError> {
        let input_args = self.write_inputs(&request).await?;
        let mut cmd = self.build_command(&request, &input_args);

        tracing::info!(
            task_id = %request.task_id,
            script = %self.script.display(),
            save_path = %request.output_path.display(),
            "Spawning generation process"
        );

        let mut child = cmd
            .spawn()
            .map_err(|e| EngineError::SpawnError(e.to_string()))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::SpawnError("failed to capture stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::SpawnError("failed to capture stderr".to_string()))?;

        // stderr 只保留末尾若干行用于错误报告
        let stderr_task = tokio::spawn(async move {
            let mut tail: Vec<String> = Vec::new();
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tail.len() == STDERR_TAIL_LINES {
                    tail.remove(0);
                }
                tail.push(line);
            }
            tail.join("\n")
        });

        let mut lines = BufReader::new(stdout).lines();
        let mut percent: u8 = 0;

        loop {
            tokio::select! {
                maybe_line = lines.next_line() => {
                    match maybe_line.map_err(|e| EngineError::IoError(e.to_string()))? {
                        Some(line) => {
                            let lower = line.to_lowercase();
                            if PROGRESS_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
                                percent = (percent + 2).min(100);
                                // 匹配行作为状态文案透传
                                let _ = progress.send(ProgressUpdate {
                                    percent,
                                    status_line: Some(line.clone()),
                                });
                            }
                            tracing::debug!(task_id = %request.task_id, line = %line, "engine");
                        }
                        None => break,
                    }
                }
                _ = cancel.cancelled() => {
                    tracing::info!(task_id = %request.task_id, "Killing generation process");
                    let _ = child.kill().await;
                    stderr_task.abort();
                    return Err(EngineError::Cancelled);
                }
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| EngineError::IoError(e.to_string()))?;
        let stderr_tail = stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(EngineError::ProcessFailed {
                code: status.code(),
                stderr: stderr_tail,
            });
        }

        let wav_path = self.resolve_output(&request.output_path).await?;
        Ok(GenerateOutcome {
            wav_path,
            duration_ms: None,
        })
    }

    async fn health_check(&self) -> bool {
        self.script.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::song::{GenParams, Lyrics, StylePrompt};
    use tempfile::tempdir;
    use tokio::sync::mpsc;

    fn request_for(output_path: PathBuf) -> GenerateRequest {
        GenerateRequest {
            task_id: "t1".to_string(),
            lyrics: Lyrics::new("[verse] neon lights"),
            style: StylePrompt::new("synthwave"),
            params: GenParams::default(),
            output_path,
        }
    }

    #[tokio::test]
    async fn test_inputs_written_to_assets() {
        let dir = tempdir().unwrap();
        let engine = SubprocessEngine::new(
            "python",
            PathBuf::from("scripts/run_music_generation.py"),
            dir.path().to_path_buf(),
        );

        let args = engine
            .write_inputs(&request_for(PathBuf::from("out.wav")))
            .await
            .unwrap();

        assert_eq!(args.len(), 2);
        let lyrics = std::fs::read_to_string(dir.path().join("lyrics.txt")).unwrap();
        assert_eq!(lyrics, "[verse] neon lights");
        let tags = std::fs::read_to_string(dir.path().join("tags.txt")).unwrap();
        assert_eq!(tags, "synthwave");
    }

    #[tokio::test]
    async fn test_instrumental_skips_lyrics_file() {
        let dir = tempdir().unwrap();
        let engine = SubprocessEngine::new(
            "python",
            PathBuf::from("scripts/run_music_generation.py"),
            dir.path().to_path_buf(),
        );

        let mut request = request_for(PathBuf::from("out.wav"));
        request.lyrics = Lyrics::new("");
        let args = engine.write_inputs(&request).await.unwrap();

        assert!(args.iter().all(|a| !a.starts_with("--lyrics")));
        assert!(!dir.path().join("lyrics.txt").exists());
    }

    #[tokio::test]
    async fn test_resolve_output_falls_back_to_newest_wav() {
        let dir = tempdir().unwrap();
        let engine = SubprocessEngine::new(
            "python",
            PathBuf::from("scripts/run_music_generation.py"),
            dir.path().join("assets"),
        );

        std::fs::write(dir.path().join("older.wav"), b"a").unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        std::fs::write(dir.path().join("newer.wav"), b"b").unwrap();

        let resolved = engine
            .resolve_output(&dir.path().join("missing.wav"))
            .await
            .unwrap();
        assert_eq!(resolved, dir.path().join("newer.wav"));
    }

    #[tokio::test]
    async fn test_spawn_failure_reported() {
        let dir = tempdir().unwrap();
        let engine = SubprocessEngine::new(
            "definitely-not-a-real-binary-xyz",
            PathBuf::from("scripts/run_music_generation.py"),
            dir.path().to_path_buf(),
        );

        let (tx, _rx) = mpsc::unbounded_channel();
        let result = engine
            .generate(
                request_for(dir.path().join("out.wav")),
                tx,
                CancellationToken::new(),
            )
            .await;
        assert!(matches!(result, Err(EngineError::SpawnError(_))));
    }
}
