//! 后台 Worker

mod generation_worker;

pub use generation_worker::{spawn_task_cleanup, GenerationWorker, GenerationWorkerConfig};
