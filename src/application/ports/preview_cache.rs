//! Preview Cache Port - 试听转码缓存
//!
//! 定义转码结果缓存的抽象接口，具体实现使用 Sled (LRU 缓存)

use super::PreviewFormat;
use async_trait::async_trait;
use thiserror::Error;

/// Preview Cache 错误
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache entry not found: {0}")]
    NotFound(String),

    #[error("Cache full, eviction failed")]
    EvictionFailed,

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// 缓存元数据
#[derive(Debug, Clone)]
pub struct CacheMetadata {
    pub title: String,
    pub format: PreviewFormat,
    pub content_hash: String,
    pub duration_ms: u64,
    pub sample_rate: Option<u32>,
}

/// 缓存条目
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub audio_data: Vec<u8>,
    pub metadata: CacheMetadata,
    pub size_bytes: u64,
    pub last_accessed: i64,
    pub created_at: i64,
}

/// Preview Cache Port
///
/// 基于源 WAV 内容 hash 的 LRU 缓存
/// - 缓存 key: md5(wav 数据) + 输出格式
/// - 源文件改变（重新生成）时 hash 变化，旧条目自然失效
#[async_trait]
pub trait PreviewCachePort: Send + Sync {
    /// 存储转码结果
    ///
    /// 自动执行 LRU 淘汰以保持缓存大小在限制内
    async fn put(
        &self,
        cache_key: &str,
        audio_data: Vec<u8>,
        metadata: CacheMetadata,
    ) -> Result<(), CacheError>;

    /// 根据缓存 key 获取转码结果
    ///
    /// 同时更新 last_accessed 时间戳（LRU touch）
    async fn get(&self, cache_key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// 检查缓存是否存在
    async fn exists(&self, cache_key: &str) -> Result<bool, CacheError>;

    /// 删除缓存条目
    async fn remove(&self, cache_key: &str) -> Result<(), CacheError>;

    /// 获取缓存统计信息
    async fn stats(&self) -> CacheStats;
}

/// 缓存统计信息
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub total_entries: usize,
    pub total_size_bytes: u64,
    pub max_size_bytes: u64,
    pub hit_count: u64,
    pub miss_count: u64,
}

/// 生成缓存 key
///
/// 使用 md5(wav 数据) + 输出格式作为缓存 key
pub fn generate_preview_key(wav_data: &[u8], format: PreviewFormat) -> String {
    let digest = md5::compute(wav_data);
    format!("{:x}:{}", digest, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_key_varies_by_content_and_format() {
        let a = generate_preview_key(b"riff-one", PreviewFormat::Opus);
        let b = generate_preview_key(b"riff-two", PreviewFormat::Opus);
        let c = generate_preview_key(b"riff-one", PreviewFormat::Wav);

        assert_ne!(a, b);
        assert_ne!(a, c);
        assert!(a.ends_with(":opus"));
        assert!(c.ends_with(":wav"));
    }

    #[test]
    fn test_preview_key_stable() {
        let a = generate_preview_key(b"same-bytes", PreviewFormat::Opus);
        let b = generate_preview_key(b"same-bytes", PreviewFormat::Opus);
        assert_eq!(a, b);
    }
}
