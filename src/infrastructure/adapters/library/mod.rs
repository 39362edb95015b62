//! Library Adapters - 歌曲库存储实现

mod file_library;

pub use file_library::FileSongLibrary;
