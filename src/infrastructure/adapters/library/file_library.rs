//! File Song Library - 文件系统歌曲库实现
//!
//! 存储布局（与既有歌曲库兼容）:
//! - songs/<stem>.wav      音频
//! - covers/<stem>.png     封面
//! - metadata/<stem>.json  元数据边车文件
//!
//! WAV 是歌曲存在的依据，缺元数据时从文件名重建最小记录。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{DeleteReport, LibraryError, SongLibraryPort, SongRecord};
use crate::domain::song::{GenParams, Lyrics, Song, SongTitle, StylePrompt};

/// 文件系统歌曲库
pub struct FileSongLibrary {
    songs_dir: PathBuf,
    covers_dir: PathBuf,
    metadata_dir: PathBuf,
}

impl FileSongLibrary {
    /// 创建歌曲库，确保三个子目录存在
    pub async fn new(library_root: impl AsRef<Path>) -> Result<Self, LibraryError> {
        let root = library_root.as_ref();
        let library = Self {
            songs_dir: root.join("songs"),
            covers_dir: root.join("covers"),
            metadata_dir: root.join("metadata"),
        };

        for dir in [&library.songs_dir, &library.covers_dir, &library.metadata_dir] {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| LibraryError::IoError(e.to_string()))?;
        }
        Ok(library)
    }

    fn metadata_path(&self, title: &SongTitle) -> PathBuf {
        self.metadata_dir.join(title.metadata_name())
    }

    /// 从 WAV 路径装配完整记录
    async fn record_for_wav(&self, wav_path: &Path) -> Result<Option<SongRecord>, LibraryError> {
        let Some(stem) = wav_path.file_stem().and_then(|s| s.to_str()) else {
            return Ok(None);
        };

        let meta = match fs::metadata(wav_path).await {
            Ok(m) => m,
            // list 与读取之间文件可能被删除
            Err(_) => return Ok(None),
        };
        let modified_at: DateTime<Utc> = meta
            .modified()
            .map(DateTime::from)
            .unwrap_or_else(|_| Utc::now());

        let title = SongTitle::new(stem)
            .map_err(|e| LibraryError::MetadataError(e.to_string()))?;

        let mut song = match self.load_metadata(&title).await {
            Some(song) => song,
            None => Song::new(
                title.clone(),
                Lyrics::default(),
                StylePrompt::default(),
                GenParams::default(),
            )
            .map_err(|e| LibraryError::MetadataError(e.to_string()))?,
        };

        let cover = self.covers_dir.join(title.cover_name());
        let cover_path = if cover.exists() {
            song.set_cover(cover.clone());
            Some(cover)
        } else {
            None
        };

        Ok(Some(SongRecord {
            song,
            wav_path: wav_path.to_path_buf(),
            cover_path,
            modified_at,
            size_bytes: meta.len(),
        }))
    }

    /// 读取元数据边车文件，缺失或损坏时返回 None
    async fn load_metadata(&self, title: &SongTitle) -> Option<Song> {
        let path = self.metadata_path(title);
        let text = fs::read_to_string(&path).await.ok()?;
        match serde_json::from_str(&text) {
            Ok(song) => Some(song),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Invalid metadata sidecar, falling back to filename"
                );
                None
            }
        }
    }
}

#[async_trait]
impl SongLibraryPort for FileSongLibrary {
    async fn list(&self) -> Result<Vec<SongRecord>, LibraryError> {
        let mut records = Vec::new();
        let mut entries = fs::read_dir(&self.songs_dir)
            .await
            .map_err(|e| LibraryError::IoError(e.to_string()))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| LibraryError::IoError(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "wav") {
                if let Some(record) = self.record_for_wav(&path).await? {
                    records.push(record);
                }
            }
        }

        // 最近修改的排前面
        records.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
        Ok(records)
    }

    async fn get(&self, title: &SongTitle) -> Result<Option<SongRecord>, LibraryError> {
        let wav = self.wav_path(title);
        if !wav.exists() {
            return Ok(None);
        }
        self.record_for_wav(&wav).await
    }

    async fn save_metadata(&self, song: &Song) -> Result<PathBuf, LibraryError> {
        let path = self.metadata_path(song.title());
        let json = serde_json::to_string_pretty(song)
            .map_err(|e| LibraryError::MetadataError(e.to_string()))?;

        fs::write(&path, json)
            .await
            .map_err(|e| LibraryError::IoError(e.to_string()))?;

        tracing::debug!(title = %song.title(), path = %path.display(), "Metadata saved");
        Ok(path)
    }

    async fn delete(&self, title: &SongTitle) -> Result<DeleteReport, LibraryError> {
        let mut report = DeleteReport::default();

        for (path, removed) in [
            (self.wav_path(title), &mut report.wav_removed),
            (self.cover_path(title), &mut report.cover_removed),
            (self.metadata_path(title), &mut report.metadata_removed),
        ] {
            if path.exists() {
                fs::remove_file(&path)
                    .await
                    .map_err(|e| LibraryError::IoError(e.to_string()))?;
                *removed = true;
            }
        }

        Ok(report)
    }

    async fn exists(&self, title: &SongTitle) -> bool {
        self.wav_path(title).exists()
    }

    async fn next_untitled(&self) -> Result<SongTitle, LibraryError> {
        let mut max_n = 0u32;
        let mut entries = fs::read_dir(&self.songs_dir)
            .await
            .map_err(|e| LibraryError::IoError(e.to_string()))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| LibraryError::IoError(e.to_string()))?
        {
            let path = entry.path();
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if let Some(n) = stem
                    .strip_prefix("Untitled_")
                    .and_then(|rest| rest.parse::<u32>().ok())
                {
                    max_n = max_n.max(n);
                }
            }
        }

        SongTitle::new(format!("Untitled_{}", max_n + 1))
            .map_err(|e| LibraryError::MetadataError(e.to_string()))
    }

    fn wav_path(&self, title: &SongTitle) -> PathBuf {
        self.songs_dir.join(title.wav_name())
    }

    fn cover_path(&self, title: &SongTitle) -> PathBuf {
        self.covers_dir.join(title.cover_name())
    }

    async fn save_cover(&self, title: &SongTitle, png_data: &[u8]) -> Result<PathBuf, LibraryError> {
        let path = self.cover_path(title);
        fs::write(&path, png_data)
            .await
            .map_err(|e| LibraryError::IoError(e.to_string()))?;

        tracing::debug!(title = %title, path = %path.display(), "Cover saved");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn write_wav(library: &FileSongLibrary, title: &str) -> SongTitle {
        let title = SongTitle::new(title).unwrap();
        fs::write(library.wav_path(&title), b"RIFF-fake-wav")
            .await
            .unwrap();
        title
    }

    #[tokio::test]
    async fn test_list_sorted_by_mtime_desc() {
        let dir = tempdir().unwrap();
        let library = FileSongLibrary::new(dir.path()).await.unwrap();

        write_wav(&library, "Older").await;
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        write_wav(&library, "Newer").await;

        let records = library.list().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].song.title().as_str(), "Newer");
        assert_eq!(records[1].song.title().as_str(), "Older");
    }

    #[tokio::test]
    async fn test_metadata_roundtrip_through_sidecar() {
        let dir = tempdir().unwrap();
        let library = FileSongLibrary::new(dir.path()).await.unwrap();

        let title = write_wav(&library, "With Meta").await;
        let song = Song::new(
            title.clone(),
            Lyrics::new("[verse] hello"),
            StylePrompt::new("jazz, ballad"),
            GenParams::default(),
        )
        .unwrap();
        library.save_metadata(&song).await.unwrap();

        let record = library.get(&title).await.unwrap().unwrap();
        assert_eq!(record.song.lyrics().as_str(), "[verse] hello");
        assert_eq!(record.song.style().as_str(), "jazz, ballad");
    }

    #[tokio::test]
    async fn test_song_without_metadata_reconstructed_from_filename() {
        let dir = tempdir().unwrap();
        let library = FileSongLibrary::new(dir.path()).await.unwrap();

        let title = write_wav(&library, "Bare Song").await;
        let record = library.get(&title).await.unwrap().unwrap();
        assert_eq!(record.song.title().as_str(), "Bare Song");
        assert!(record.song.lyrics().is_instrumental());
    }

    #[tokio::test]
    async fn test_delete_removes_all_three_files() {
        let dir = tempdir().unwrap();
        let library = FileSongLibrary::new(dir.path()).await.unwrap();

        let title = write_wav(&library, "Doomed").await;
        library.save_cover(&title, b"fake-png").await.unwrap();
        let song = Song::new(
            title.clone(),
            Lyrics::default(),
            StylePrompt::default(),
            GenParams::default(),
        )
        .unwrap();
        library.save_metadata(&song).await.unwrap();

        let report = library.delete(&title).await.unwrap();
        assert!(report.wav_removed);
        assert!(report.cover_removed);
        assert!(report.metadata_removed);
        assert!(!library.exists(&title).await);
    }

    #[tokio::test]
    async fn test_next_untitled_skips_existing() {
        let dir = tempdir().unwrap();
        let library = FileSongLibrary::new(dir.path()).await.unwrap();

        assert_eq!(library.next_untitled().await.unwrap().as_str(), "Untitled_1");

        write_wav(&library, "Untitled_1").await;
        write_wav(&library, "Untitled_7").await;
        assert_eq!(library.next_untitled().await.unwrap().as_str(), "Untitled_8");
    }
}
