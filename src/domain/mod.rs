//! Domain Layer - 领域层
//!
//! 包含:
//! - Song Context: 歌曲管理上下文
//! - Styles: 风格目录（styles_db.json）与随机组合
//! - Player: 播放位置状态机

pub mod song;

mod player;
mod styles;

pub use player::{PlayerSnapshot, PlayerState};
pub use styles::StyleCatalog;
