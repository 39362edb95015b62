//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 资源未找到
    #[error("{resource_type} not found: {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 业务规则违反
    #[error("Business rule violation: {0}")]
    BusinessRuleViolation(String),

    /// 状态无效
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// 外部引擎错误
    #[error("Engine error: {0}")]
    EngineError(String),

    /// 存储错误
    #[error("Storage error: {0}")]
    StorageError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建业务规则违反错误
    pub fn business_rule(message: impl Into<String>) -> Self {
        Self::BusinessRuleViolation(message.into())
    }

    /// 创建状态无效错误
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<crate::domain::song::SongError> for ApplicationError {
    fn from(err: crate::domain::song::SongError) -> Self {
        match err {
            crate::domain::song::SongError::NotFound(title) => {
                Self::not_found("Song", title)
            }
            crate::domain::song::SongError::AlreadyExists(title) => {
                Self::business_rule(format!("Song already exists: {}", title))
            }
            other => Self::ValidationError(other.to_string()),
        }
    }
}

impl From<crate::application::ports::LibraryError> for ApplicationError {
    fn from(err: crate::application::ports::LibraryError) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<crate::application::ports::TaskError> for ApplicationError {
    fn from(err: crate::application::ports::TaskError) -> Self {
        match err {
            crate::application::ports::TaskError::NotFound(id) => Self::not_found("Task", id),
            other => Self::InvalidState(other.to_string()),
        }
    }
}

impl From<crate::application::ports::PlaybackError> for ApplicationError {
    fn from(err: crate::application::ports::PlaybackError) -> Self {
        match err {
            crate::application::ports::PlaybackError::SessionNotFound(id) => {
                Self::not_found("Playback session", id)
            }
            other => Self::InvalidState(other.to_string()),
        }
    }
}

impl From<crate::application::ports::CoverError> for ApplicationError {
    fn from(err: crate::application::ports::CoverError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<crate::application::ports::TranscodeError> for ApplicationError {
    fn from(err: crate::application::ports::TranscodeError) -> Self {
        Self::InternalError(err.to_string())
    }
}
