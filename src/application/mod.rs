//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（GenerationEngine、SongLibrary、TaskManager、PlayerManager 等）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    // Generation commands
    CancelGenerationCommand,
    CancelGenerationResponse,
    RemixSongCommand,
    SubmitGenerationCommand,
    SubmitGenerationResponse,
    // Library commands
    DeleteSongCommand,
    DeleteSongResponse,
    UploadCoverCommand,
    UploadCoverResponse,
    // Player commands
    PauseCommand,
    PlayCommand,
    ResumeCommand,
    SeekCommand,
    StopCommand,
    StopResponse,
    // Handlers
    handlers::{
        CancelGenerationHandler, DeleteSongHandler, PauseHandler, PlayHandler, RemixSongHandler,
        ResumeHandler, SeekHandler, StopHandler, SubmitGenerationHandler, UploadCoverHandler,
    },
};

pub use error::ApplicationError;

pub use ports::{
    // Audio transcoder
    AudioInfo,
    AudioTranscoderPort,
    PreviewFormat,
    TranscodeConfig,
    TranscodeError,
    TranscodeResult,
    // Cover art
    CoverArtPort,
    CoverError,
    COVER_SIZE,
    // Generation engine
    EngineError,
    GenerateOutcome,
    GenerateRequest,
    GenerationEnginePort,
    ProgressSender,
    ProgressUpdate,
    // Player manager
    PlaybackError,
    PlaybackStatus,
    PlayerManagerPort,
    // Preview cache
    generate_preview_key,
    CacheEntry,
    CacheError,
    CacheMetadata,
    CacheStats,
    PreviewCachePort,
    // Song library
    DeleteReport,
    LibraryError,
    SongLibraryPort,
    SongRecord,
    // Task manager
    GenerationTask,
    TaskError,
    TaskManagerPort,
    TaskState,
};

pub use queries::{
    // Audio queries
    GetPreview,
    GetPreviewResponse,
    GetSongAudio,
    GetSongAudioResponse,
    // Library queries
    GetSong,
    ListSongs,
    // Style queries
    GetStyleOptions,
    StyleOptionsResponse,
    SurpriseStyle,
    SurpriseStyleResponse,
    // Task queries
    GetTaskStatus,
    ListActiveTasks,
    TaskStatusResponse,
    // Handlers
    handlers::{
        GetPreviewHandler, GetSongAudioHandler, GetSongHandler, GetStyleOptionsHandler,
        GetTaskStatusHandler, ListActiveTasksHandler, ListSongsHandler, SurpriseStyleHandler,
    },
};
