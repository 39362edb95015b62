//! Sled-based LRU Preview Cache Implementation
//!
//! 缓存 key 由源 WAV 内容 hash 派生，歌曲重新生成后旧条目不再被引用，
//! 由 LRU 淘汰自然回收。

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::application::ports::{
    CacheError, CacheMetadata, CacheStats, PreviewCachePort, PreviewFormat,
};

const ENTRY_PREFIX: &str = "preview:";

/// Sled 缓存配置
#[derive(Debug, Clone)]
pub struct SledCacheConfig {
    /// 数据库路径
    pub db_path: String,
    /// 最大缓存大小（字节）
    pub max_size_bytes: u64,
}

impl Default for SledCacheConfig {
    fn default() -> Self {
        Self {
            db_path: "data/preview.sled".to_string(),
            max_size_bytes: 2 * 1024 * 1024 * 1024, // 2GB
        }
    }
}

/// 内部缓存条目
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    audio_data: Vec<u8>,
    size_bytes: u64,
    title: String,
    format: PreviewFormat,
    content_hash: String,
    duration_ms: u64,
    sample_rate: Option<u32>,
    last_accessed: i64,
    created_at: i64,
}

/// Sled 试听缓存
pub struct SledPreviewCache {
    db: Db,
    max_size_bytes: u64,
    current_size: AtomicU64,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl SledPreviewCache {
    pub fn new(config: &SledCacheConfig) -> Result<Self, CacheError> {
        let db = sled::open(&config.db_path)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

        // 启动时重算占用，崩溃恢复后计数器与磁盘保持一致
        let current_size = Self::calculate_total_size(&db)?;

        tracing::info!(
            db_path = %config.db_path,
            max_size_bytes = config.max_size_bytes,
            current_size = current_size,
            "SledPreviewCache initialized"
        );

        Ok(Self {
            db,
            max_size_bytes: config.max_size_bytes,
            current_size: AtomicU64::new(current_size),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        })
    }

    pub fn open<P: AsRef<Path>>(path: P, max_size_bytes: u64) -> Result<Self, CacheError> {
        let config = SledCacheConfig {
            db_path: path.as_ref().to_string_lossy().to_string(),
            max_size_bytes,
        };
        Self::new(&config)
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn entry_key(cache_key: &str) -> String {
        format!("{}{}", ENTRY_PREFIX, cache_key)
    }

    fn calculate_total_size(db: &Db) -> Result<u64, CacheError> {
        let mut total = 0u64;
        for item in db.scan_prefix(ENTRY_PREFIX) {
            let (_, value) = item.map_err(|e| CacheError::DatabaseError(e.to_string()))?;
            if let Ok(entry) = bincode::deserialize::<StoredEntry>(&value) {
                total += entry.size_bytes;
            }
        }
        Ok(total)
    }

    /// 淘汰 last_accessed 最旧的一个条目
    fn evict_lru(&self) -> Result<(), CacheError> {
        let mut oldest: Option<(Vec<u8>, StoredEntry)> = None;

        for item in self.db.scan_prefix(ENTRY_PREFIX) {
            let (key, value) = item.map_err(|e| CacheError::DatabaseError(e.to_string()))?;
            if let Ok(entry) = bincode::deserialize::<StoredEntry>(&value) {
                let is_older = oldest
                    .as_ref()
                    .map(|(_, e)| entry.last_accessed < e.last_accessed)
                    .unwrap_or(true);
                if is_older {
                    oldest = Some((key.to_vec(), entry));
                }
            }
        }

        let (key, entry) = oldest.ok_or(CacheError::EvictionFailed)?;
        self.db
            .remove(&key)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;
        self.current_size.fetch_sub(entry.size_bytes, Ordering::Relaxed);

        tracing::debug!(
            title = %entry.title,
            size_bytes = entry.size_bytes,
            "LRU evicted preview entry"
        );

        Ok(())
    }

    pub fn flush(&self) -> Result<(), CacheError> {
        self.db
            .flush()
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl PreviewCachePort for SledPreviewCache {
    async fn put(
        &self,
        cache_key: &str,
        audio_data: Vec<u8>,
        metadata: CacheMetadata,
    ) -> Result<(), CacheError> {
        let size = audio_data.len() as u64;

        // 单条目就超限的直接拒收，避免无限淘汰
        if size > self.max_size_bytes {
            return Err(CacheError::EvictionFailed);
        }

        while self.current_size.load(Ordering::Relaxed) + size > self.max_size_bytes {
            self.evict_lru()?;
        }

        let now = Utc::now().timestamp();
        let entry = StoredEntry {
            audio_data,
            size_bytes: size,
            title: metadata.title,
            format: metadata.format,
            content_hash: metadata.content_hash,
            duration_ms: metadata.duration_ms,
            sample_rate: metadata.sample_rate,
            last_accessed: now,
            created_at: now,
        };

        let entry_bytes = bincode::serialize(&entry)
            .map_err(|e| CacheError::SerializationError(e.to_string()))?;

        self.db
            .insert(Self::entry_key(cache_key), entry_bytes)
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?;
        self.current_size.fetch_add(size, Ordering::Relaxed);

        tracing::debug!(
            cache_key = %cache_key,
            size_bytes = size,
            "Preview cached"
        );

        Ok(())
    }

    async fn get(&self, cache_key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let key = Self::entry_key(cache_key);

        match self.db.get(&key) {
            Ok(Some(data)) => {
                let mut entry: StoredEntry = bincode::deserialize(&data)
                    .map_err(|e| CacheError::SerializationError(e.to_string()))?;

                // LRU touch
                entry.last_accessed = Utc::now().timestamp();
                let entry_bytes = bincode::serialize(&entry)
                    .map_err(|e| CacheError::SerializationError(e.to_string()))?;
                self.db
                    .insert(&key, entry_bytes)
                    .map_err(|e| CacheError::DatabaseError(e.to_string()))?;

                self.hit_count.fetch_add(1, Ordering::Relaxed);
                Ok(Some(entry.audio_data))
            }
            Ok(None) => {
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            Err(e) => Err(CacheError::DatabaseError(e.to_string())),
        }
    }

    async fn exists(&self, cache_key: &str) -> Result<bool, CacheError> {
        self.db
            .contains_key(Self::entry_key(cache_key))
            .map_err(|e| CacheError::DatabaseError(e.to_string()))
    }

    async fn remove(&self, cache_key: &str) -> Result<(), CacheError> {
        if let Some(data) = self
            .db
            .remove(Self::entry_key(cache_key))
            .map_err(|e| CacheError::DatabaseError(e.to_string()))?
        {
            if let Ok(entry) = bincode::deserialize::<StoredEntry>(&data) {
                self.current_size.fetch_sub(entry.size_bytes, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    async fn stats(&self) -> CacheStats {
        let total_entries = self.db.scan_prefix(ENTRY_PREFIX).count();

        CacheStats {
            total_entries,
            total_size_bytes: self.current_size.load(Ordering::Relaxed),
            max_size_bytes: self.max_size_bytes,
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_cache(dir: &Path, max: u64) -> SledPreviewCache {
        SledPreviewCache::open(dir.join("test.sled"), max).unwrap()
    }

    fn metadata(title: &str) -> CacheMetadata {
        CacheMetadata {
            title: title.to_string(),
            format: PreviewFormat::Opus,
            content_hash: format!("hash-{}", title),
            duration_ms: 1000,
            sample_rate: Some(44_100),
        }
    }

    #[tokio::test]
    async fn test_put_get_exists() {
        let dir = tempdir().unwrap();
        let cache = open_cache(dir.path(), 1024 * 1024);

        let audio = vec![1u8, 2, 3, 4, 5];
        cache.put("k1", audio.clone(), metadata("Song A")).await.unwrap();

        assert_eq!(cache.get("k1").await.unwrap(), Some(audio));
        assert!(cache.exists("k1").await.unwrap());
        assert_eq!(cache.get("missing").await.unwrap(), None);

        let stats = cache.stats().await;
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
    }

    #[tokio::test]
    async fn test_remove_frees_space() {
        let dir = tempdir().unwrap();
        let cache = open_cache(dir.path(), 1024);

        cache.put("k1", vec![0u8; 100], metadata("Song A")).await.unwrap();
        cache.remove("k1").await.unwrap();

        let stats = cache.stats().await;
        assert_eq!(stats.total_entries, 0);
        assert_eq!(stats.total_size_bytes, 0);
    }

    #[tokio::test]
    async fn test_lru_eviction_drops_oldest() {
        let dir = tempdir().unwrap();
        let cache = open_cache(dir.path(), 250);

        cache.put("k1", vec![0u8; 100], metadata("First")).await.unwrap();
        cache.put("k2", vec![0u8; 100], metadata("Second")).await.unwrap();
        // 第三个条目触发淘汰，k1 最旧
        cache.put("k3", vec![0u8; 100], metadata("Third")).await.unwrap();

        assert!(!cache.exists("k1").await.unwrap());
        assert!(cache.exists("k2").await.unwrap());
        assert!(cache.exists("k3").await.unwrap());
    }

    #[tokio::test]
    async fn test_oversized_entry_rejected() {
        let dir = tempdir().unwrap();
        let cache = open_cache(dir.path(), 50);

        let result = cache.put("big", vec![0u8; 100], metadata("Huge")).await;
        assert!(result.is_err());
    }
}
