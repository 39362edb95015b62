//! Command Handlers - 命令处理器

mod generate_command_handlers;
mod library_handlers;
mod player_command_handlers;

pub use generate_command_handlers::{
    CancelGenerationHandler, RemixSongHandler, SubmitGenerationHandler,
};
pub use library_handlers::{DeleteSongHandler, UploadCoverHandler};
pub use player_command_handlers::{
    PauseHandler, PlayHandler, ResumeHandler, SeekHandler, StopHandler,
};
