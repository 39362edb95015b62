//! Library Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{SongLibraryPort, SongRecord};
use crate::application::queries::library_queries::{GetSong, ListSongs};
use crate::domain::song::SongTitle;

/// ListSongs Handler - 列出全部歌曲
pub struct ListSongsHandler {
    library: Arc<dyn SongLibraryPort>,
}

impl ListSongsHandler {
    pub fn new(library: Arc<dyn SongLibraryPort>) -> Self {
        Self { library }
    }

    pub async fn handle(&self, _query: ListSongs) -> Result<Vec<SongRecord>, ApplicationError> {
        let records = self.library.list().await?;
        tracing::debug!(count = records.len(), "Library listed");
        Ok(records)
    }
}

/// GetSong Handler - 获取单首歌曲
pub struct GetSongHandler {
    library: Arc<dyn SongLibraryPort>,
}

impl GetSongHandler {
    pub fn new(library: Arc<dyn SongLibraryPort>) -> Self {
        Self { library }
    }

    pub async fn handle(&self, query: GetSong) -> Result<SongRecord, ApplicationError> {
        let title = SongTitle::new(&query.title)?;
        self.library
            .get(&title)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Song", &query.title))
    }
}
