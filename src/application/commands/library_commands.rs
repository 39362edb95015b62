//! Library Commands - 歌曲库相关命令

use std::path::PathBuf;

/// 删除歌曲命令
///
/// 同时删除 WAV、封面和元数据三个文件
#[derive(Debug, Clone)]
pub struct DeleteSongCommand {
    pub title: String,
}

/// 删除歌曲响应
#[derive(Debug, Clone)]
pub struct DeleteSongResponse {
    pub wav_removed: bool,
    pub cover_removed: bool,
    pub metadata_removed: bool,
}

/// 上传封面命令
///
/// 图片会被中心裁剪为正方形并缩放到标准边长
#[derive(Debug, Clone)]
pub struct UploadCoverCommand {
    pub title: String,
    pub image_data: Vec<u8>,
}

/// 上传封面响应
#[derive(Debug, Clone)]
pub struct UploadCoverResponse {
    pub cover_path: PathBuf,
}
