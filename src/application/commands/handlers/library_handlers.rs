//! Library Command Handlers

use std::sync::Arc;

use crate::application::commands::library_commands::*;
use crate::application::error::ApplicationError;
use crate::application::ports::{CoverArtPort, SongLibraryPort, TaskManagerPort};
use crate::domain::song::SongTitle;

/// DeleteSong Handler - 删除歌曲及其关联文件
pub struct DeleteSongHandler {
    library: Arc<dyn SongLibraryPort>,
    task_manager: Arc<dyn TaskManagerPort>,
}

impl DeleteSongHandler {
    pub fn new(library: Arc<dyn SongLibraryPort>, task_manager: Arc<dyn TaskManagerPort>) -> Self {
        Self {
            library,
            task_manager,
        }
    }

    pub async fn handle(&self, cmd: DeleteSongCommand) -> Result<DeleteSongResponse, ApplicationError> {
        let title = SongTitle::new(&cmd.title)?;

        // 生成中的歌曲不允许删除
        if self.task_manager.is_title_in_flight(title.as_str()) {
            return Err(ApplicationError::business_rule(format!(
                "Cannot delete song while generation is in progress: {}",
                title
            )));
        }

        let report = self.library.delete(&title).await?;
        if !report.wav_removed && !report.cover_removed && !report.metadata_removed {
            return Err(ApplicationError::not_found("Song", &cmd.title));
        }

        tracing::info!(
            title = %title,
            wav = report.wav_removed,
            cover = report.cover_removed,
            metadata = report.metadata_removed,
            "Song deleted"
        );

        Ok(DeleteSongResponse {
            wav_removed: report.wav_removed,
            cover_removed: report.cover_removed,
            metadata_removed: report.metadata_removed,
        })
    }
}

/// UploadCover Handler - 上传歌曲封面
///
/// 图片被中心裁剪为正方形、缩放到标准边长后以 PNG 存储，
/// 元数据边车文件同步更新封面路径
pub struct UploadCoverHandler {
    library: Arc<dyn SongLibraryPort>,
    cover_art: Arc<dyn CoverArtPort>,
}

impl UploadCoverHandler {
    pub fn new(library: Arc<dyn SongLibraryPort>, cover_art: Arc<dyn CoverArtPort>) -> Self {
        Self { library, cover_art }
    }

    pub async fn handle(&self, cmd: UploadCoverCommand) -> Result<UploadCoverResponse, ApplicationError> {
        let title = SongTitle::new(&cmd.title)?;

        let record = self
            .library
            .get(&title)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Song", &cmd.title))?;

        let png = self.cover_art.process_upload(&cmd.image_data)?;
        let cover_path = self.library.save_cover(&title, &png).await?;

        let mut song = record.song;
        song.set_cover(cover_path.clone());
        self.library.save_metadata(&song).await?;

        tracing::info!(
            title = %title,
            cover_path = %cover_path.display(),
            bytes = png.len(),
            "Cover uploaded"
        );

        Ok(UploadCoverResponse { cover_path })
    }
}
