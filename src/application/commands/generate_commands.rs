//! Generation Commands - 音乐生成相关命令

use crate::application::ports::TaskState;

/// 提交生成任务命令
///
/// 标题缺省时自动分配 "Untitled_N"，采样参数缺省时使用配置默认值
#[derive(Debug, Clone, Default)]
pub struct SubmitGenerationCommand {
    pub title: Option<String>,
    /// 歌词（可含段落标签），空表示纯器乐
    pub lyrics: String,
    /// 自由文本风格描述
    pub style: String,
    pub topk: Option<u32>,
    pub temperature: Option<f32>,
    pub cfg_scale: Option<f32>,
    pub max_audio_length_ms: Option<u64>,
}

/// 提交生成响应
#[derive(Debug, Clone)]
pub struct SubmitGenerationResponse {
    pub task_id: String,
    pub title: String,
    pub state: TaskState,
}

/// Remix 命令 - 以既有歌曲的歌词和风格重新生成
#[derive(Debug, Clone)]
pub struct RemixSongCommand {
    pub title: String,
    pub topk: Option<u32>,
    pub temperature: Option<f32>,
    pub cfg_scale: Option<f32>,
}

/// 取消生成任务命令
#[derive(Debug, Clone)]
pub struct CancelGenerationCommand {
    pub task_id: String,
}

/// 取消生成响应
#[derive(Debug, Clone)]
pub struct CancelGenerationResponse {
    pub cancelled: bool,
}
