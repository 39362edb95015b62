//! 基础设施适配器 - 端口的具体实现

pub mod covers;
pub mod engine;
pub mod library;
pub mod transcoder;
