//! Song Library Port - 歌曲库存储抽象
//!
//! 定义歌曲库的抽象接口，具体实现基于文件系统 + JSON 元数据边车文件

use crate::domain::song::{Song, SongTitle};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

/// Song Library 错误
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Song not found: {0}")]
    NotFound(String),

    #[error("Song already exists: {0}")]
    AlreadyExists(String),

    #[error("Metadata error: {0}")]
    MetadataError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// 库内歌曲记录
///
/// 聚合元数据与磁盘文件位置，列表按 WAV 修改时间倒序
#[derive(Debug, Clone)]
pub struct SongRecord {
    pub song: Song,
    pub wav_path: PathBuf,
    pub cover_path: Option<PathBuf>,
    /// WAV 文件修改时间（排序依据）
    pub modified_at: DateTime<Utc>,
    /// WAV 文件大小（字节）
    pub size_bytes: u64,
}

/// 删除结果
#[derive(Debug, Clone, Default)]
pub struct DeleteReport {
    pub wav_removed: bool,
    pub cover_removed: bool,
    pub metadata_removed: bool,
}

/// Song Library Port
///
/// 歌曲库的存储契约:
/// - WAV 在 songs/，封面在 covers/，元数据 JSON 在 metadata/
/// - 三者以标题的文件名化形式关联
#[async_trait]
pub trait SongLibraryPort: Send + Sync {
    /// 列出全部歌曲，按修改时间倒序
    async fn list(&self) -> Result<Vec<SongRecord>, LibraryError>;

    /// 按标题获取歌曲
    async fn get(&self, title: &SongTitle) -> Result<Option<SongRecord>, LibraryError>;

    /// 写入/覆盖元数据边车文件，返回写入路径
    async fn save_metadata(&self, song: &Song) -> Result<PathBuf, LibraryError>;

    /// 删除歌曲的 WAV、封面和元数据
    async fn delete(&self, title: &SongTitle) -> Result<DeleteReport, LibraryError>;

    /// 标题对应的 WAV 是否存在
    async fn exists(&self, title: &SongTitle) -> bool;

    /// 生成下一个未占用的 "Untitled_N" 标题
    async fn next_untitled(&self) -> Result<SongTitle, LibraryError>;

    /// 标题对应的 WAV 目标路径（文件可能尚不存在）
    fn wav_path(&self, title: &SongTitle) -> PathBuf;

    /// 标题对应的封面目标路径（文件可能尚不存在）
    fn cover_path(&self, title: &SongTitle) -> PathBuf;

    /// 写入封面图片数据，返回写入路径
    async fn save_cover(&self, title: &SongTitle, png_data: &[u8]) -> Result<PathBuf, LibraryError>;
}
