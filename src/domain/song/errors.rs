//! Song Context - Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SongError {
    #[error("song not found: {0}")]
    NotFound(String),

    #[error("song already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid title: {0}")]
    InvalidTitle(String),

    #[error("invalid generation params: {0}")]
    InvalidParams(String),

    #[error("storage error: {0}")]
    StorageError(String),
}
