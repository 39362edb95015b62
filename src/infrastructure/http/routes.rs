//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping              GET   健康检查
//! - /api/song/list         GET   列出曲库（按修改时间倒序）
//! - /api/song/get          POST  获取歌曲详情
//! - /api/song/delete       POST  删除歌曲（WAV + 封面 + 元数据）
//! - /api/song/audio/{title}   GET 下载原始 WAV（流式）
//! - /api/song/preview/{title} GET 试听音频（转码 + 缓存）
//! - /api/song/cover/{title}   GET 封面 PNG
//! - /api/song/cover        POST  上传封面（multipart，居中裁剪到 500x500）
//! - /api/generate/submit   POST  提交生成任务
//! - /api/generate/remix    POST  以既有歌曲重新生成
//! - /api/generate/cancel   POST  取消生成任务
//! - /api/generate/status   POST  查询任务状态
//! - /api/generate/active   GET   列出进行中的任务
//! - /api/style/options     GET   风格目录
//! - /api/style/surprise    GET   随机风格提示词
//! - /api/player/play       POST  开始播放
//! - /api/player/pause      POST  暂停
//! - /api/player/resume     POST  继续
//! - /api/player/seek       POST  跳转
//! - /api/player/status     POST  查询播放状态
//! - /api/player/stop       POST  停止播放
//! - /ws/events             WS    全局事件（生成进度 / 状态变更）

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/events", get(handlers::events_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/song", song_routes())
        .nest("/generate", generate_routes())
        .nest("/style", style_routes())
        .nest("/player", player_routes())
}

/// Song 路由
fn song_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/list", get(handlers::list_songs))
        .route("/get", post(handlers::get_song))
        .route("/delete", post(handlers::delete_song))
        .route("/audio/:title", get(handlers::download_song_audio))
        .route("/preview/:title", get(handlers::get_preview))
        .route("/cover/:title", get(handlers::get_cover))
        .route("/cover", post(handlers::upload_cover))
}

/// Generate 路由
fn generate_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/submit", post(handlers::submit_generation))
        .route("/remix", post(handlers::remix_song))
        .route("/cancel", post(handlers::cancel_generation))
        .route("/status", post(handlers::get_task_status))
        .route("/active", get(handlers::list_active_tasks))
}

/// Style 路由
fn style_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/options", get(handlers::get_style_options))
        .route("/surprise", get(handlers::surprise_style))
}

/// Player 路由
fn player_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/play", post(handlers::play))
        .route("/pause", post(handlers::pause))
        .route("/resume", post(handlers::resume))
        .route("/seek", post(handlers::seek))
        .route("/status", post(handlers::player_status))
        .route("/stop", post(handlers::stop))
}
