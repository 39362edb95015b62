//! Memory Layer - In-Memory State Management
//!
//! 实现 TaskManager 和 PlayerManager，管理生成任务和播放会话的内存状态

mod player_sessions;
mod task_manager;

pub use player_sessions::InMemoryPlayerManager;
pub use task_manager::InMemoryTaskManager;
