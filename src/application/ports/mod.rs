//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_transcoder;
mod cover_art;
mod generation_engine;
mod player_manager;
mod preview_cache;
mod song_library;
mod task_manager;

pub use audio_transcoder::{
    AudioInfo, AudioTranscoderPort, PreviewFormat, TranscodeConfig, TranscodeError, TranscodeResult,
};
pub use cover_art::{CoverArtPort, CoverError, COVER_SIZE};
pub use generation_engine::{
    EngineError, GenerateOutcome, GenerateRequest, GenerationEnginePort, ProgressSender,
    ProgressUpdate,
};
pub use player_manager::{PlaybackError, PlaybackStatus, PlayerManagerPort};
pub use preview_cache::{
    generate_preview_key, CacheEntry, CacheError, CacheMetadata, CacheStats, PreviewCachePort,
};
pub use song_library::{DeleteReport, LibraryError, SongLibraryPort, SongRecord};
pub use task_manager::{GenerationTask, TaskError, TaskManagerPort, TaskState};
