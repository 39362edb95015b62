//! Song Context - 歌曲限界上下文
//!
//! 职责:
//! - 歌曲聚合管理（标题、歌词、风格、生成参数）
//! - 文件名安全化（标题 → 文件 stem）
//! - 生成参数范围校验

mod aggregate;
mod errors;
mod value_objects;

pub use aggregate::Song;
pub use errors::SongError;
pub use value_objects::{GenParams, Lyrics, ModelVersion, SongTitle, StylePrompt};
