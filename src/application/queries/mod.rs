//! Queries - CQRS 查询定义

mod audio_queries;
mod library_queries;
mod style_queries;
mod task_queries;

pub mod handlers;

pub use audio_queries::{GetPreview, GetPreviewResponse, GetSongAudio, GetSongAudioResponse};
pub use library_queries::{GetSong, ListSongs};
pub use style_queries::{
    GetStyleOptions, StyleOptionsResponse, SurpriseStyle, SurpriseStyleResponse,
};
pub use task_queries::{GetTaskStatus, ListActiveTasks, TaskStatusResponse};
