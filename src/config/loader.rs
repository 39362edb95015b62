//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `MULA_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `MULA_SERVER__PORT=8080`
/// - `MULA_ENGINE__MODEL_PATH=/models/heartmula`
/// - `MULA_ENGINE__VERSION=8B`
/// - `MULA_STORAGE__LIBRARY_ROOT=/data/output`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5170)?
        .set_default("server.max_upload_size", 20 * 1024 * 1024)?
        .set_default("engine.python", "python")?
        .set_default("engine.script", "scripts/run_music_generation.py")?
        .set_default("engine.model_path", "./ckpt")?
        .set_default("engine.version", "3B")?
        .set_default("engine.max_concurrent", 1)?
        .set_default("generation.topk", 50)?
        .set_default("generation.temperature", 1.0)?
        .set_default("generation.cfg_scale", 1.5)?
        .set_default("generation.max_audio_length_ms", 4 * 60 * 1000)?
        .set_default("generation.task_retention_secs", 3600)?
        .set_default("storage.library_root", "output")?
        .set_default("storage.assets_dir", "assets")?
        .set_default("preview.format", "opus")?
        .set_default("preview.bitrate", 96000)?
        .set_default("preview.cache_path", "data/preview.sled")?
        .set_default("preview.max_cache_bytes", 2_u64 * 1024 * 1024 * 1024)?
        .set_default("launcher.env_name", "heartlib")?
        .set_default("launcher.env_manager", "conda")?
        .set_default("launcher.studio_command", "mula-studio")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        // 搜索默认配置文件
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 前缀: MULA_
    // 层级分隔符: __ (双下划线)
    // 例如: MULA_ENGINE__VERSION=8B
    builder = builder.add_source(
        Environment::with_prefix("MULA")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

    // 6. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    // 验证端口范围
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    // 验证模型版本
    if !matches!(config.engine.version.as_str(), "1B" | "3B" | "8B") {
        return Err(ConfigError::ValidationError(format!(
            "Unknown model version: {} (expected 1B, 3B or 8B)",
            config.engine.version
        )));
    }

    // 验证并发数
    if config.engine.max_concurrent == 0 {
        return Err(ConfigError::ValidationError(
            "engine.max_concurrent cannot be 0".to_string(),
        ));
    }

    // 验证启动器环境名
    if config.launcher.env_name.is_empty() {
        return Err(ConfigError::ValidationError(
            "Launcher env_name cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Engine Script: {:?}", config.engine.script);
    tracing::info!("Model Path: {:?}", config.engine.model_path);
    tracing::info!("Model Version: {}", config.engine.version);
    tracing::info!("Max Concurrent Generations: {}", config.engine.max_concurrent);
    tracing::info!("Library Root: {:?}", config.storage.library_root);
    tracing::info!("Assets Directory: {:?}", config.storage.assets_dir);
    tracing::info!("Preview Format: {}", config.preview.format);
    tracing::info!("Preview Cache: {}", config.preview.cache_path);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5170);
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_unknown_version() {
        let mut config = AppConfig::default();
        config.engine.version = "13B".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_env_name() {
        let mut config = AppConfig::default();
        config.launcher.env_name = String::new();
        assert!(validate_config(&config).is_err());
    }
}
