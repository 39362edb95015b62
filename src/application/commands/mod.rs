//! Commands - CQRS 命令定义

mod generate_commands;
mod library_commands;
mod player_commands;

pub mod handlers;

pub use generate_commands::{
    CancelGenerationCommand, CancelGenerationResponse, RemixSongCommand, SubmitGenerationCommand,
    SubmitGenerationResponse,
};
pub use library_commands::{
    DeleteSongCommand, DeleteSongResponse, UploadCoverCommand, UploadCoverResponse,
};
pub use player_commands::{
    PauseCommand, PlayCommand, ResumeCommand, SeekCommand, StopCommand, StopResponse,
};
