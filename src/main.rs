//! MuLa Studio - 音乐生成工作室服务
//!
//! 架构分层:
//! - Domain: song/, player, styles
//! - Application: commands, queries, ports
//! - Infrastructure: http, memory, worker, persistence, adapters, events

use std::sync::Arc;

use mula_studio::config::{load_config, print_config};
use mula_studio::domain::song::{GenParams, ModelVersion};
use mula_studio::domain::StyleCatalog;
use mula_studio::infrastructure::adapters::covers::CoverRenderer;
use mula_studio::infrastructure::adapters::engine::SubprocessEngine;
// use mula_studio::infrastructure::adapters::engine::{FakeEngine, FakeEngineConfig};
use mula_studio::infrastructure::adapters::library::FileSongLibrary;
use mula_studio::infrastructure::adapters::transcoder::WavTranscoder;
use mula_studio::infrastructure::events::EventPublisher;
use mula_studio::infrastructure::http::{AppState, HttpServer, ServerConfig};
use mula_studio::infrastructure::memory::{InMemoryPlayerManager, InMemoryTaskManager};
use mula_studio::infrastructure::persistence::sled::{SledCacheConfig, SledPreviewCache};
use mula_studio::infrastructure::worker::{
    spawn_task_cleanup, GenerationWorker, GenerationWorkerConfig,
};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},mula_studio={},tower_http=debug",
        config.log.level, config.log.level
    );
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));
    if config.log.json {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    tracing::info!("MuLa Studio - 音乐生成工作室服务");
    print_config(&config);

    // 确保数据目录存在
    tokio::fs::create_dir_all(&config.storage.assets_dir).await?;
    if let Some(parent) = std::path::Path::new(&config.preview.cache_path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 默认生成参数
    let version: ModelVersion = config
        .engine
        .version
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid model version in config: {}", e))?;
    let default_params = GenParams {
        model_path: config.engine.model_path.clone(),
        version,
        topk: config.generation.topk,
        temperature: config.generation.temperature,
        cfg_scale: config.generation.cfg_scale,
        max_audio_length_ms: config.generation.max_audio_length_ms,
    };
    default_params
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid generation defaults: {}", e))?;

    // 文件曲库（自动创建 songs/ covers/ metadata/）
    let library = Arc::new(FileSongLibrary::new(&config.storage.library_root).await?);

    // 子进程生成引擎
    let engine = Arc::new(SubprocessEngine::new(
        config.engine.python.clone(),
        config.engine.script.clone(),
        config.storage.assets_dir.clone(),
    ));

    // // Fake 引擎（测试用，生成正弦波）
    // let engine = Arc::new(FakeEngine::new(FakeEngineConfig::default()));

    // 转码器与试听缓存
    let transcoder = Arc::new(WavTranscoder::new());
    let cache_config = SledCacheConfig {
        db_path: config.preview.cache_path.clone(),
        max_size_bytes: config.preview.max_cache_bytes,
    };
    let preview_cache = Arc::new(SledPreviewCache::new(&cache_config)?);

    // 封面渲染器
    let cover_art = Arc::new(CoverRenderer::new());

    // 风格目录
    let style_catalog = Arc::new(StyleCatalog::load(
        &config.storage.assets_dir.join("styles_db.json"),
    ));

    // 事件发布器
    let event_publisher = Arc::new(EventPublisher::new());

    // 生成任务队列与内存管理器
    let (task_tx, task_rx) = mpsc::channel(100);
    let task_manager = Arc::new(InMemoryTaskManager::new(task_tx));
    let players = Arc::new(InMemoryPlayerManager::new());

    // 后台生成 Worker
    let worker_config = GenerationWorkerConfig {
        max_concurrent: config.engine.max_concurrent,
        ..Default::default()
    };
    let worker = GenerationWorker::new(
        worker_config,
        task_rx,
        task_manager.clone(),
        engine,
        library.clone(),
        cover_art.clone(),
        event_publisher.clone(),
    );
    tokio::spawn(worker.run());

    // 周期清理终态任务
    spawn_task_cleanup(
        task_manager.clone(),
        std::time::Duration::from_secs(60),
        chrono::Duration::seconds(config.generation.task_retention_secs as i64),
    );

    // HTTP 服务器
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        max_upload_size: config.server.max_upload_size as usize,
    };
    let state = AppState::new(
        library,
        task_manager,
        players,
        transcoder,
        preview_cache,
        cover_art,
        style_catalog,
        event_publisher,
        default_params,
        config.preview.format,
        config.preview.bitrate,
    );

    let server = HttpServer::new(server_config, state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to listen for ctrl-c");
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
