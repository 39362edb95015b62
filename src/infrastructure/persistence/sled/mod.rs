//! Sled 持久化实现

mod preview_cache;

pub use preview_cache::{SledCacheConfig, SledPreviewCache};
