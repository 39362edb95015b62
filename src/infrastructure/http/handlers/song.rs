//! Song HTTP Handlers - 曲库管理

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::application::{
    DeleteSongCommand, GetPreview, GetSong, GetSongAudio, ListSongs, PreviewFormat,
    UploadCoverCommand,
};
use crate::domain::song::SongTitle;
use crate::infrastructure::http::dto::{ApiResponse, Empty, SongResponse};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

// ============================================================================
// DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GetSongRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteSongRequest {
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteSongDto {
    pub wav_removed: bool,
    pub cover_removed: bool,
    pub metadata_removed: bool,
}

#[derive(Debug, Deserialize)]
pub struct PreviewParams {
    /// "wav" 或 "opus"，缺省使用配置默认格式
    pub format: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// 列出曲库（按 WAV 修改时间倒序）
pub async fn list_songs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<SongResponse>>>, ApiError> {
    let records = state.list_songs_handler.handle(ListSongs).await?;

    let responses: Vec<SongResponse> = records.into_iter().map(SongResponse::from).collect();
    Ok(Json(ApiResponse::success(responses)))
}

/// 获取歌曲详情
pub async fn get_song(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GetSongRequest>,
) -> Result<Json<ApiResponse<SongResponse>>, ApiError> {
    let record = state
        .get_song_handler
        .handle(GetSong { title: req.title })
        .await?;

    Ok(Json(ApiResponse::success(SongResponse::from(record))))
}

/// 删除歌曲（WAV + 封面 + 元数据，完成后广播 WS 事件）
pub async fn delete_song(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeleteSongRequest>,
) -> Result<Json<ApiResponse<DeleteSongDto>>, ApiError> {
    let title = req.title.clone();
    let result = state
        .delete_song_handler
        .handle(DeleteSongCommand { title: req.title })
        .await?;

    tracing::info!(title = %title, "Song deleted");
    state.event_publisher.publish_song_deleted(&title);

    Ok(Json(ApiResponse::success(DeleteSongDto {
        wav_removed: result.wav_removed,
        cover_removed: result.cover_removed,
        metadata_removed: result.metadata_removed,
    })))
}

/// 下载原始 WAV（流式）
pub async fn download_song_audio(
    State(state): State<Arc<AppState>>,
    Path(title): Path<String>,
) -> Result<Response, ApiError> {
    let result = state
        .get_song_audio_handler
        .handle(GetSongAudio {
            title: title.clone(),
        })
        .await?;

    let file = tokio::fs::File::open(&result.wav_path)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to open audio file: {}", e)))?;

    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "audio/wav")
        .header(header::CONTENT_LENGTH, result.size_bytes)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}.wav\"", title),
        )
        .body(body)
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}

/// 试听音频（转码 + 缓存）
pub async fn get_preview(
    State(state): State<Arc<AppState>>,
    Path(title): Path<String>,
    Query(params): Query<PreviewParams>,
) -> Result<Response, ApiError> {
    let format = match params.format.as_deref() {
        Some(s) => Some(
            s.parse::<PreviewFormat>()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        ),
        None => None,
    };

    let result = state
        .get_preview_handler
        .handle(GetPreview { title, format })
        .await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, result.content_type)
        .header(header::CONTENT_LENGTH, result.audio_data.len())
        .header("X-Preview-Cache", if result.from_cache { "hit" } else { "miss" })
        .body(Body::from(result.audio_data))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}

/// 获取封面 PNG
pub async fn get_cover(
    State(state): State<Arc<AppState>>,
    Path(title): Path<String>,
) -> Result<Response, ApiError> {
    let song_title =
        SongTitle::new(&title).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let cover_path = state.library.cover_path(&song_title);
    if !cover_path.exists() {
        return Err(ApiError::NotFound(format!("Cover not found: {}", title)));
    }

    let file = tokio::fs::File::open(&cover_path)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to open cover file: {}", e)))?;

    let stream = ReaderStream::new(file);
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/png")
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}

/// 上传封面（multipart: title + file，居中裁剪到标准边长）
pub async fn upload_cover(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    let mut title: Option<String> = None;
    let mut image_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "title" => {
                title = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Failed to read title: {}", e)))?,
                );
            }
            "file" => {
                let filename = field.file_name().map(|s| s.to_lowercase());
                let valid_exts = [".png", ".jpg", ".jpeg", ".webp", ".bmp"];
                if !filename
                    .as_ref()
                    .map(|f| valid_exts.iter().any(|ext| f.ends_with(ext)))
                    .unwrap_or(false)
                {
                    return Err(ApiError::BadRequest(
                        "Only PNG, JPEG, WebP, BMP images are allowed".to_string(),
                    ));
                }

                image_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?
                        .to_vec(),
                );
            }
            _ => {}
        }
    }

    let title = title.ok_or_else(|| ApiError::BadRequest("Title is required".to_string()))?;
    let image_data =
        image_data.ok_or_else(|| ApiError::BadRequest("Image file is required".to_string()))?;

    state
        .upload_cover_handler
        .handle(UploadCoverCommand {
            title: title.clone(),
            image_data,
        })
        .await?;

    tracing::info!(title = %title, "Cover uploaded");
    state.event_publisher.publish_cover_updated(&title);

    Ok(Json(ApiResponse::ok()))
}
