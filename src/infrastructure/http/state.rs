//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    CancelGenerationHandler, DeleteSongHandler, PauseHandler, PlayHandler, RemixSongHandler,
    ResumeHandler, SeekHandler, StopHandler, SubmitGenerationHandler, UploadCoverHandler,
    // Query handlers
    GetPreviewHandler, GetSongAudioHandler, GetSongHandler, GetStyleOptionsHandler,
    GetTaskStatusHandler, ListActiveTasksHandler, ListSongsHandler, SurpriseStyleHandler,
    // Ports
    AudioTranscoderPort, CoverArtPort, PlayerManagerPort, PreviewCachePort, PreviewFormat,
    SongLibraryPort, TaskManagerPort,
};
use crate::domain::song::GenParams;
use crate::domain::StyleCatalog;
use crate::infrastructure::events::EventPublisher;

/// 应用状态
///
/// TaskManager 和 PlayerManager 为内存实现，曲库为文件系统实现
pub struct AppState {
    // ========== Ports ==========
    pub library: Arc<dyn SongLibraryPort>,
    pub task_manager: Arc<dyn TaskManagerPort>,
    pub players: Arc<dyn PlayerManagerPort>,
    pub event_publisher: Arc<EventPublisher>,

    // ========== Command Handlers ==========
    pub submit_generation_handler: Arc<SubmitGenerationHandler>,
    pub remix_song_handler: RemixSongHandler,
    pub cancel_generation_handler: CancelGenerationHandler,
    pub delete_song_handler: DeleteSongHandler,
    pub upload_cover_handler: UploadCoverHandler,
    pub play_handler: PlayHandler,
    pub pause_handler: PauseHandler,
    pub resume_handler: ResumeHandler,
    pub seek_handler: SeekHandler,
    pub stop_handler: StopHandler,

    // ========== Query Handlers ==========
    pub list_songs_handler: ListSongsHandler,
    pub get_song_handler: GetSongHandler,
    pub get_task_status_handler: GetTaskStatusHandler,
    pub list_active_tasks_handler: ListActiveTasksHandler,
    pub get_style_options_handler: GetStyleOptionsHandler,
    pub surprise_style_handler: SurpriseStyleHandler,
    pub get_song_audio_handler: GetSongAudioHandler,
    pub get_preview_handler: GetPreviewHandler,
}

impl AppState {
    /// 创建应用状态
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        library: Arc<dyn SongLibraryPort>,
        task_manager: Arc<dyn TaskManagerPort>,
        players: Arc<dyn PlayerManagerPort>,
        transcoder: Arc<dyn AudioTranscoderPort>,
        preview_cache: Arc<dyn PreviewCachePort>,
        cover_art: Arc<dyn CoverArtPort>,
        style_catalog: Arc<StyleCatalog>,
        event_publisher: Arc<EventPublisher>,
        default_params: GenParams,
        preview_format: PreviewFormat,
        preview_bitrate: u32,
    ) -> Self {
        let submit_generation_handler = Arc::new(SubmitGenerationHandler::new(
            library.clone(),
            task_manager.clone(),
            default_params,
        ));

        Self {
            // Ports
            library: library.clone(),
            task_manager: task_manager.clone(),
            players: players.clone(),
            event_publisher,

            // Command handlers
            submit_generation_handler: submit_generation_handler.clone(),
            remix_song_handler: RemixSongHandler::new(
                library.clone(),
                submit_generation_handler.clone(),
            ),
            cancel_generation_handler: CancelGenerationHandler::new(task_manager.clone()),
            delete_song_handler: DeleteSongHandler::new(library.clone(), task_manager.clone()),
            upload_cover_handler: UploadCoverHandler::new(library.clone(), cover_art),
            play_handler: PlayHandler::new(
                library.clone(),
                players.clone(),
                transcoder.clone(),
            ),
            pause_handler: PauseHandler::new(players.clone()),
            resume_handler: ResumeHandler::new(players.clone()),
            seek_handler: SeekHandler::new(players.clone()),
            stop_handler: StopHandler::new(players),

            // Query handlers
            list_songs_handler: ListSongsHandler::new(library.clone()),
            get_song_handler: GetSongHandler::new(library.clone()),
            get_task_status_handler: GetTaskStatusHandler::new(task_manager.clone()),
            list_active_tasks_handler: ListActiveTasksHandler::new(task_manager),
            get_style_options_handler: GetStyleOptionsHandler::new(style_catalog.clone()),
            surprise_style_handler: SurpriseStyleHandler::new(style_catalog),
            get_song_audio_handler: GetSongAudioHandler::new(library.clone()),
            get_preview_handler: GetPreviewHandler::new(
                library,
                transcoder,
                preview_cache,
                preview_format,
                preview_bitrate,
            ),
        }
    }
}
