//! Infrastructure Layer - 基础设施层
//!
//! 包含端口的具体实现：文件曲库、子进程引擎、转码器、
//! 内存任务/播放管理、Sled 缓存、HTTP 服务与后台 Worker。

pub mod adapters;
pub mod events;
pub mod http;
pub mod memory;
pub mod persistence;
pub mod worker;

pub use adapters::covers::CoverRenderer;
pub use adapters::engine::{FakeEngine, SubprocessEngine};
pub use adapters::library::FileSongLibrary;
pub use adapters::transcoder::WavTranscoder;
pub use events::EventPublisher;
pub use memory::{InMemoryPlayerManager, InMemoryTaskManager};
pub use persistence::sled::{SledCacheConfig, SledPreviewCache};
pub use worker::{GenerationWorker, GenerationWorkerConfig};
