//! Query Handlers - 查询处理器

mod audio_handlers;
mod library_handlers;
mod style_handlers;
mod task_handlers;

pub use audio_handlers::{GetPreviewHandler, GetSongAudioHandler};
pub use library_handlers::{GetSongHandler, ListSongsHandler};
pub use style_handlers::{GetStyleOptionsHandler, SurpriseStyleHandler};
pub use task_handlers::{GetTaskStatusHandler, ListActiveTasksHandler};
