//! Audio Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    generate_preview_key, AudioTranscoderPort, CacheMetadata, PreviewCachePort, PreviewFormat,
    SongLibraryPort, TranscodeConfig,
};
use crate::application::queries::audio_queries::{
    GetPreview, GetPreviewResponse, GetSongAudio, GetSongAudioResponse,
};
use crate::domain::song::SongTitle;

/// GetSongAudio Handler - 定位原始 WAV 供流式下载
pub struct GetSongAudioHandler {
    library: Arc<dyn SongLibraryPort>,
}

impl GetSongAudioHandler {
    pub fn new(library: Arc<dyn SongLibraryPort>) -> Self {
        Self { library }
    }

    pub async fn handle(&self, query: GetSongAudio) -> Result<GetSongAudioResponse, ApplicationError> {
        let title = SongTitle::new(&query.title)?;
        let record = self
            .library
            .get(&title)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Song", &query.title))?;

        Ok(GetSongAudioResponse {
            wav_path: record.wav_path,
            size_bytes: record.size_bytes,
        })
    }
}

/// GetPreview Handler - 转码试听（带 LRU 缓存）
///
/// 缓存 key = md5(wav 数据) + 格式，重新生成后旧条目自然失效
pub struct GetPreviewHandler {
    library: Arc<dyn SongLibraryPort>,
    transcoder: Arc<dyn AudioTranscoderPort>,
    cache: Arc<dyn PreviewCachePort>,
    default_format: PreviewFormat,
    bitrate: u32,
}

impl GetPreviewHandler {
    pub fn new(
        library: Arc<dyn SongLibraryPort>,
        transcoder: Arc<dyn AudioTranscoderPort>,
        cache: Arc<dyn PreviewCachePort>,
        default_format: PreviewFormat,
        bitrate: u32,
    ) -> Self {
        Self {
            library,
            transcoder,
            cache,
            default_format,
            bitrate,
        }
    }

    pub async fn handle(&self, query: GetPreview) -> Result<GetPreviewResponse, ApplicationError> {
        let title = SongTitle::new(&query.title)?;
        let format = query.format.unwrap_or(self.default_format);

        let record = self
            .library
            .get(&title)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Song", &query.title))?;

        let wav_data = tokio::fs::read(&record.wav_path)
            .await
            .map_err(|e| ApplicationError::StorageError(e.to_string()))?;

        let info = self.transcoder.get_audio_info(&wav_data)?;

        // WAV 直接返回，不经过转码和缓存
        if format == PreviewFormat::Wav {
            return Ok(GetPreviewResponse {
                content_type: format.content_type(),
                audio_data: wav_data,
                format,
                duration_ms: info.duration_ms,
                from_cache: false,
            });
        }

        let cache_key = generate_preview_key(&wav_data, format);

        if let Some(cached) = self
            .cache
            .get(&cache_key)
            .await
            .map_err(|e| ApplicationError::internal(e.to_string()))?
        {
            tracing::debug!(title = %title, cache_key = %cache_key, "Preview cache hit");
            return Ok(GetPreviewResponse {
                audio_data: cached,
                format,
                content_type: format.content_type(),
                duration_ms: info.duration_ms,
                from_cache: true,
            });
        }

        let config = TranscodeConfig {
            format,
            bitrate: Some(self.bitrate),
            channels: None,
        };
        let result = self.transcoder.transcode(&wav_data, &config).await?;

        tracing::info!(
            title = %title,
            format = %format,
            original_size = result.original_size,
            transcoded_size = result.transcoded_size,
            "Preview transcoded"
        );

        let metadata = CacheMetadata {
            title: title.to_string(),
            format,
            content_hash: cache_key.clone(),
            duration_ms: result.duration_ms,
            sample_rate: Some(result.sample_rate),
        };
        if let Err(e) = self
            .cache
            .put(&cache_key, result.audio_data.clone(), metadata)
            .await
        {
            tracing::warn!(cache_key = %cache_key, error = %e, "Failed to cache preview");
        }

        Ok(GetPreviewResponse {
            audio_data: result.audio_data,
            format,
            content_type: format.content_type(),
            duration_ms: result.duration_ms,
            from_cache: false,
        })
    }
}
