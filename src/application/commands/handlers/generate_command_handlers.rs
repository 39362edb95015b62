//! Generation Command Handlers

use std::sync::Arc;

use crate::application::commands::generate_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    GenerateRequest, GenerationTask, SongLibraryPort, TaskError, TaskManagerPort,
};
use crate::domain::song::{GenParams, Lyrics, Song, SongTitle, StylePrompt};

/// SubmitGeneration Handler - 提交音乐生成任务
pub struct SubmitGenerationHandler {
    library: Arc<dyn SongLibraryPort>,
    task_manager: Arc<dyn TaskManagerPort>,
    /// 配置派生的参数默认值
    defaults: GenParams,
}

impl SubmitGenerationHandler {
    pub fn new(
        library: Arc<dyn SongLibraryPort>,
        task_manager: Arc<dyn TaskManagerPort>,
        defaults: GenParams,
    ) -> Self {
        Self {
            library,
            task_manager,
            defaults,
        }
    }

    pub async fn handle(
        &self,
        cmd: SubmitGenerationCommand,
    ) -> Result<SubmitGenerationResponse, ApplicationError> {
        // 标题缺省时分配 Untitled_N
        let title = match cmd.title {
            Some(t) => SongTitle::new(t)?,
            None => self.library.next_untitled().await?,
        };

        // 同标题同时只允许一个进行中的任务
        if self.task_manager.is_title_in_flight(title.as_str()) {
            return Err(ApplicationError::business_rule(format!(
                "Generation already in progress for title: {}",
                title
            )));
        }

        let params = GenParams {
            topk: cmd.topk.unwrap_or(self.defaults.topk),
            temperature: cmd.temperature.unwrap_or(self.defaults.temperature),
            cfg_scale: cmd.cfg_scale.unwrap_or(self.defaults.cfg_scale),
            max_audio_length_ms: cmd
                .max_audio_length_ms
                .unwrap_or(self.defaults.max_audio_length_ms),
            ..self.defaults.clone()
        };

        let lyrics = Lyrics::new(cmd.lyrics);
        let style = StylePrompt::new(cmd.style);

        // Song::new 校验参数范围。元数据 sidecar 由 worker 在生成成功后写入，
        // 失败或取消的任务不留孤儿元数据
        Song::new(title.clone(), lyrics.clone(), style.clone(), params.clone())?;

        let task = GenerationTask::new(title.to_string());
        let request = GenerateRequest {
            task_id: task.task_id.clone(),
            lyrics,
            style,
            params,
            output_path: self.library.wav_path(&title),
        };

        let task_id = self
            .task_manager
            .submit(task, request)
            .map_err(|e| match e {
                TaskError::TitleInFlight(t) => ApplicationError::business_rule(format!(
                    "Generation already in progress for title: {}",
                    t
                )),
                other => ApplicationError::internal(other.to_string()),
            })?;

        tracing::info!(
            task_id = %task_id,
            title = %title,
            "Generation task submitted"
        );

        Ok(SubmitGenerationResponse {
            task_id,
            title: title.to_string(),
            state: crate::application::ports::TaskState::Pending,
        })
    }
}

/// RemixSong Handler - 以既有歌曲的歌词和风格重新生成
pub struct RemixSongHandler {
    library: Arc<dyn SongLibraryPort>,
    submit: Arc<SubmitGenerationHandler>,
}

impl RemixSongHandler {
    pub fn new(library: Arc<dyn SongLibraryPort>, submit: Arc<SubmitGenerationHandler>) -> Self {
        Self { library, submit }
    }

    pub async fn handle(
        &self,
        cmd: RemixSongCommand,
    ) -> Result<SubmitGenerationResponse, ApplicationError> {
        let title = SongTitle::new(&cmd.title)?;
        let record = self
            .library
            .get(&title)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Song", &cmd.title))?;

        let draft = record.song.remix_draft()?;

        tracing::info!(
            source = %cmd.title,
            remix_title = %draft.title(),
            "Remixing song"
        );

        self.submit
            .handle(SubmitGenerationCommand {
                title: Some(draft.title().to_string()),
                lyrics: draft.lyrics().as_str().to_string(),
                style: draft.style().as_str().to_string(),
                topk: cmd.topk,
                temperature: cmd.temperature,
                cfg_scale: cmd.cfg_scale,
                max_audio_length_ms: Some(draft.params().max_audio_length_ms),
            })
            .await
    }
}

/// CancelGeneration Handler - 取消生成任务
pub struct CancelGenerationHandler {
    task_manager: Arc<dyn TaskManagerPort>,
}

impl CancelGenerationHandler {
    pub fn new(task_manager: Arc<dyn TaskManagerPort>) -> Self {
        Self { task_manager }
    }

    pub fn handle(&self, cmd: CancelGenerationCommand) -> CancelGenerationResponse {
        let cancelled = self.task_manager.cancel(&cmd.task_id);
        if cancelled {
            tracing::info!(task_id = %cmd.task_id, "Generation task cancelled");
        }
        CancelGenerationResponse { cancelled }
    }
}
