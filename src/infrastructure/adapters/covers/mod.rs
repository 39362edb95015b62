//! Cover Adapters - 封面图像处理实现

mod cover_renderer;

pub use cover_renderer::CoverRenderer;
