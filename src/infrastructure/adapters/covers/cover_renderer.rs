//! Cover Renderer - 封面图像处理实现
//!
//! - 渐变封面: 对角线双色渐变，颜色由标题 hash 播种，同标题恒定
//! - 上传处理: 中心裁剪为正方形后 Lanczos 缩放到标准边长

use image::imageops::FilterType;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Cursor;

use crate::application::ports::{CoverArtPort, CoverError, COVER_SIZE};

/// 封面渲染器
#[derive(Debug, Default)]
pub struct CoverRenderer;

impl CoverRenderer {
    pub fn new() -> Self {
        Self
    }

    fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, CoverError> {
        let mut buf = Cursor::new(Vec::new());
        image
            .write_to(&mut buf, ImageFormat::Png)
            .map_err(|e| CoverError::EncodeError(e.to_string()))?;
        Ok(buf.into_inner())
    }
}

impl CoverArtPort for CoverRenderer {
    fn generate_gradient(&self, title: &str) -> Result<Vec<u8>, CoverError> {
        // 标题 hash 播种，重启后同标题得到相同封面
        let digest = md5::compute(title.as_bytes());
        let seed = u64::from_le_bytes(digest.0[..8].try_into().unwrap_or([0; 8]));
        let mut rng = StdRng::seed_from_u64(seed);

        let color1: [u8; 3] = [rng.gen(), rng.gen(), rng.gen()];
        let color2: [u8; 3] = [rng.gen(), rng.gen(), rng.gen()];

        let size = COVER_SIZE;
        let denom = (2 * size - 2) as f32;
        let buffer = ImageBuffer::from_fn(size, size, |x, y| {
            // 左上到右下的对角线渐变
            let ratio = (x + y) as f32 / denom;
            Rgb([
                (color1[0] as f32 * (1.0 - ratio) + color2[0] as f32 * ratio) as u8,
                (color1[1] as f32 * (1.0 - ratio) + color2[1] as f32 * ratio) as u8,
                (color1[2] as f32 * (1.0 - ratio) + color2[2] as f32 * ratio) as u8,
            ])
        });

        Self::encode_png(&DynamicImage::ImageRgb8(buffer))
    }

    fn process_upload(&self, image_data: &[u8]) -> Result<Vec<u8>, CoverError> {
        let img = image::load_from_memory(image_data)
            .map_err(|e| CoverError::DecodeError(e.to_string()))?;

        let (width, height) = (img.width(), img.height());
        let side = width.min(height);
        let left = (width - side) / 2;
        let top = (height - side) / 2;

        let square = img
            .crop_imm(left, top, side, side)
            .resize_exact(COVER_SIZE, COVER_SIZE, FilterType::Lanczos3);

        Self::encode_png(&square)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_is_deterministic_per_title() {
        let renderer = CoverRenderer::new();
        let a = renderer.generate_gradient("Midnight Run").unwrap();
        let b = renderer.generate_gradient("Midnight Run").unwrap();
        let c = renderer.generate_gradient("Other Song").unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        // PNG magic
        assert_eq!(&a[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn test_upload_crops_to_square() {
        let renderer = CoverRenderer::new();

        // 宽图 800x400，中心裁剪后应为 COVER_SIZE 正方形
        let wide = DynamicImage::ImageRgb8(ImageBuffer::from_fn(800, 400, |x, _| {
            Rgb([(x % 256) as u8, 0, 0])
        }));
        let mut buf = Cursor::new(Vec::new());
        wide.write_to(&mut buf, ImageFormat::Png).unwrap();

        let png = renderer.process_upload(&buf.into_inner()).unwrap();
        let processed = image::load_from_memory(&png).unwrap();
        assert_eq!(processed.width(), COVER_SIZE);
        assert_eq!(processed.height(), COVER_SIZE);
    }

    #[test]
    fn test_upload_rejects_garbage() {
        let renderer = CoverRenderer::new();
        assert!(matches!(
            renderer.process_upload(b"not an image"),
            Err(CoverError::DecodeError(_))
        ));
    }
}
