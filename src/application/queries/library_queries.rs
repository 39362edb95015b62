//! Library Queries - 歌曲库查询

/// 列出全部歌曲（按修改时间倒序）
#[derive(Debug, Clone, Default)]
pub struct ListSongs;

/// 按标题获取单首歌曲
#[derive(Debug, Clone)]
pub struct GetSong {
    pub title: String,
}
