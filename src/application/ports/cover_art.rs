//! Cover Art Port - 封面图像处理抽象
//!
//! 定义封面生成与上传处理的抽象接口，具体实现基于 image crate

use thiserror::Error;

/// 封面处理错误
#[derive(Debug, Error)]
pub enum CoverError {
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Failed to encode image: {0}")]
    EncodeError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// 封面输出边长（像素），封面始终为正方形
pub const COVER_SIZE: u32 = 500;

/// Cover Art Port
///
/// 封面图像处理：
/// - 为新歌生成渐变占位封面（颜色由标题派生，同标题恒定）
/// - 将用户上传的任意图片中心裁剪为正方形并缩放到标准边长
pub trait CoverArtPort: Send + Sync {
    /// 从标题生成渐变封面，返回 PNG 数据
    fn generate_gradient(&self, title: &str) -> Result<Vec<u8>, CoverError>;

    /// 处理上传图片：中心裁剪为正方形 + 缩放到 COVER_SIZE，返回 PNG 数据
    fn process_upload(&self, image_data: &[u8]) -> Result<Vec<u8>, CoverError>;
}
