//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::ports::PreviewFormat;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 生成引擎配置
    #[serde(default)]
    pub engine: EngineConfig,

    /// 生成参数默认值
    #[serde(default)]
    pub generation: GenerationConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 试听转码配置
    #[serde(default)]
    pub preview: PreviewConfig,

    /// 启动器配置
    #[serde(default)]
    pub launcher: LauncherConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 上传文件最大大小（字节）
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5170
}

fn default_max_upload_size() -> u64 {
    20 * 1024 * 1024 // 20 MB，封面图片足够
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 生成引擎配置
///
/// HeartMuLa 推理脚本以子进程方式运行
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Python 解释器（通常为 conda 环境内的 python）
    #[serde(default = "default_python")]
    pub python: String,

    /// 推理脚本路径
    #[serde(default = "default_script")]
    pub script: PathBuf,

    /// 模型 checkpoint 目录
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,

    /// 模型版本: 1B / 3B / 8B
    #[serde(default = "default_version")]
    pub version: String,

    /// 最大并发生成数（单 GPU 应为 1）
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_python() -> String {
    "python".to_string()
}

fn default_script() -> PathBuf {
    PathBuf::from("scripts/run_music_generation.py")
}

fn default_model_path() -> PathBuf {
    PathBuf::from("./ckpt")
}

fn default_version() -> String {
    "3B".to_string()
}

fn default_max_concurrent() -> usize {
    1
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            python: default_python(),
            script: default_script(),
            model_path: default_model_path(),
            version: default_version(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

/// 生成参数默认值
///
/// 前端未指定采样参数时使用
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Top-k 采样
    #[serde(default = "default_topk")]
    pub topk: u32,

    /// 采样温度
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// CFG scale
    #[serde(default = "default_cfg_scale")]
    pub cfg_scale: f32,

    /// 目标音频时长（毫秒）
    #[serde(default = "default_audio_length_ms")]
    pub max_audio_length_ms: u64,

    /// 终态任务在内存中的保留时长（秒）
    #[serde(default = "default_task_retention_secs")]
    pub task_retention_secs: u64,
}

fn default_topk() -> u32 {
    50
}

fn default_temperature() -> f32 {
    1.0
}

fn default_cfg_scale() -> f32 {
    1.5
}

fn default_audio_length_ms() -> u64 {
    4 * 60 * 1000 // 4 分钟
}

fn default_task_retention_secs() -> u64 {
    3600 // 终态任务保留 1 小时供前端查询
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            topk: default_topk(),
            temperature: default_temperature(),
            cfg_scale: default_cfg_scale(),
            max_audio_length_ms: default_audio_length_ms(),
            task_retention_secs: default_task_retention_secs(),
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 歌曲库根目录（包含 songs/ covers/ metadata/）
    #[serde(default = "default_library_root")]
    pub library_root: PathBuf,

    /// 引擎输入文件目录（lyrics.txt / tags.txt / styles_db.json）
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
}

fn default_library_root() -> PathBuf {
    PathBuf::from("output")
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            library_root: default_library_root(),
            assets_dir: default_assets_dir(),
        }
    }
}

impl StorageConfig {
    pub fn songs_dir(&self) -> PathBuf {
        self.library_root.join("songs")
    }

    pub fn covers_dir(&self) -> PathBuf {
        self.library_root.join("covers")
    }

    pub fn metadata_dir(&self) -> PathBuf {
        self.library_root.join("metadata")
    }
}

/// 试听转码配置
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewConfig {
    /// 输出格式: wav（原样）/ opus
    #[serde(default)]
    pub format: PreviewFormat,

    /// 目标比特率（bps），用于有损压缩格式
    #[serde(default = "default_bitrate")]
    pub bitrate: u32,

    /// 缓存数据库路径
    #[serde(default = "default_cache_path")]
    pub cache_path: String,

    /// 缓存最大大小（字节）
    #[serde(default = "default_cache_size")]
    pub max_cache_bytes: u64,
}

fn default_bitrate() -> u32 {
    96000 // 96kbps，音乐试听
}

fn default_cache_path() -> String {
    "data/preview.sled".to_string()
}

fn default_cache_size() -> u64 {
    2 * 1024 * 1024 * 1024 // 2 GB
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            format: PreviewFormat::default(),
            bitrate: default_bitrate(),
            cache_path: default_cache_path(),
            max_cache_bytes: default_cache_size(),
        }
    }
}

/// 启动器配置
#[derive(Debug, Clone, Deserialize)]
pub struct LauncherConfig {
    /// 运行时环境名（conda 环境）
    #[serde(default = "default_env_name")]
    pub env_name: String,

    /// 环境管理器可执行文件
    #[serde(default = "default_env_manager")]
    pub env_manager: String,

    /// 工作室进程命令
    #[serde(default = "default_studio_command")]
    pub studio_command: String,
}

fn default_env_name() -> String {
    "heartlib".to_string()
}

fn default_env_manager() -> String {
    "conda".to_string()
}

fn default_studio_command() -> String {
    "mula-studio".to_string()
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            env_name: default_env_name(),
            env_manager: default_env_manager(),
            studio_command: default_studio_command(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5170);
        assert_eq!(config.engine.version, "3B");
        assert_eq!(config.launcher.env_name, "heartlib");
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:5170");
    }

    #[test]
    fn test_library_dirs() {
        let config = StorageConfig::default();
        assert_eq!(config.songs_dir(), PathBuf::from("output/songs"));
        assert_eq!(config.covers_dir(), PathBuf::from("output/covers"));
        assert_eq!(config.metadata_dir(), PathBuf::from("output/metadata"));
    }
}
