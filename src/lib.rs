//! MuLa Studio - HeartMuLa 音乐生成工作室后端
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Song Context: 歌曲聚合（标题、歌词、风格、生成参数）
//! - Styles: 风格目录与随机组合
//! - Player: 播放位置状态机
//!
//! 应用层 (application/):
//! - Ports: 端口定义（GenerationEngine, SongLibrary, TaskManager, PlayerManager, PreviewCache）
//! - Commands: CQRS 命令处理器
//! - Queries: CQRS 查询处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Memory: TaskManager, PlayerSessions 内存实现
//! - Worker: GenerationWorker 后台任务处理
//! - Engine: HeartMuLa 子进程适配器
//! - Persistence: 文件歌曲库 + Sled 试听缓存
//! - Events: WebSocket 事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod launcher;

pub use config::{load_config, AppConfig};
