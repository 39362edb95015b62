//! Engine Adapters - 音乐生成引擎实现

mod fake_engine;
mod subprocess_engine;

pub use fake_engine::{FakeEngine, FakeEngineConfig};
pub use subprocess_engine::SubprocessEngine;
