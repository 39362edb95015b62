//! Player Commands - 播放控制命令
//!
//! 服务端只追踪播放位置状态，音频数据由客户端另行拉取

/// 开始播放命令
#[derive(Debug, Clone)]
pub struct PlayCommand {
    pub session_id: String,
    pub title: String,
}

/// 暂停命令
#[derive(Debug, Clone)]
pub struct PauseCommand {
    pub session_id: String,
}

/// 继续播放命令
#[derive(Debug, Clone)]
pub struct ResumeCommand {
    pub session_id: String,
}

/// 跳转命令
#[derive(Debug, Clone)]
pub struct SeekCommand {
    pub session_id: String,
    pub position_ms: u64,
}

/// 停止命令
#[derive(Debug, Clone)]
pub struct StopCommand {
    pub session_id: String,
}

/// 停止响应
#[derive(Debug, Clone)]
pub struct StopResponse {
    pub stopped: bool,
}
