//! Song Context - Aggregate Root

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::{GenParams, Lyrics, SongError, SongTitle, StylePrompt};

/// Song 聚合根
///
/// 不变量:
/// - 标题在歌曲库内唯一（同名文件互相覆盖）
/// - 生成参数在创建时已校验
/// - 元数据即 JSON sidecar 的序列化形式（兼容既有歌曲库）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Song {
    title: SongTitle,
    lyrics: Lyrics,
    style: StylePrompt,
    #[serde(default)]
    params: GenParams,
    #[serde(skip_serializing_if = "Option::is_none")]
    cover_path: Option<PathBuf>,
    created_at: DateTime<Utc>,
}

impl Song {
    /// 创建新歌曲（生成参数已校验）
    pub fn new(
        title: SongTitle,
        lyrics: Lyrics,
        style: StylePrompt,
        params: GenParams,
    ) -> Result<Self, SongError> {
        params.validate()?;
        Ok(Self {
            title,
            lyrics,
            style,
            params,
            cover_path: None,
            created_at: Utc::now(),
        })
    }

    /// 关联封面文件
    pub fn set_cover(&mut self, path: PathBuf) {
        self.cover_path = Some(path);
    }

    /// Remix 草稿: 标题加 "(Remix)" 后缀，其余字段复制
    pub fn remix_draft(&self) -> Result<Song, SongError> {
        let title = SongTitle::new(format!("{} (Remix)", self.title))?;
        Ok(Song {
            title,
            lyrics: self.lyrics.clone(),
            style: self.style.clone(),
            params: self.params.clone(),
            cover_path: self.cover_path.clone(),
            created_at: Utc::now(),
        })
    }

    // Getters
    pub fn title(&self) -> &SongTitle {
        &self.title
    }

    pub fn lyrics(&self) -> &Lyrics {
        &self.lyrics
    }

    pub fn style(&self) -> &StylePrompt {
        &self.style
    }

    pub fn params(&self) -> &GenParams {
        &self.params
    }

    pub fn cover_path(&self) -> Option<&PathBuf> {
        self.cover_path.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_song() -> Song {
        Song::new(
            SongTitle::new("Midnight Run").unwrap(),
            Lyrics::new("[verse]\nrunning through the night"),
            StylePrompt::new("synthwave, electronic"),
            GenParams::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_song_creation_validates_params() {
        let mut params = GenParams::default();
        params.cfg_scale = 99.0;
        let result = Song::new(
            SongTitle::new("Bad").unwrap(),
            Lyrics::default(),
            StylePrompt::default(),
            params,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_remix_draft_copies_fields() {
        let song = sample_song();
        let draft = song.remix_draft().unwrap();
        assert_eq!(draft.title().as_str(), "Midnight Run (Remix)");
        assert_eq!(draft.lyrics(), song.lyrics());
        assert_eq!(draft.style(), song.style());
    }

    #[test]
    fn test_metadata_roundtrip() {
        let mut song = sample_song();
        song.set_cover(PathBuf::from("output/covers/Midnight Run.png"));

        let json = serde_json::to_string_pretty(&song).unwrap();
        let loaded: Song = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.title(), song.title());
        assert_eq!(loaded.cover_path(), song.cover_path());
    }
}
