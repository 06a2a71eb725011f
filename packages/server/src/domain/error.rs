//! ドメイン層のエラー定義

use thiserror::Error;

/// 値オブジェクトの検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{kind} must be at most {max} characters")]
    TooLong { kind: &'static str, max: usize },

    #[error("{0} has an invalid format")]
    InvalidFormat(&'static str),
}

/// Room エンティティの不変条件違反
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoomError {
    #[error("room is full (max {max} participants)")]
    RoomFull { max: usize },

    #[error("participant '{0}' is not in the room")]
    ParticipantNotFound(String),

    #[error("invalid playback position: {0}")]
    InvalidPosition(f64),
}

/// Repository のエラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RepositoryError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),

    #[error(transparent)]
    Rejected(#[from] RoomError),

    #[error("room store unavailable: {0}")]
    Unavailable(String),
}

/// MessagePusher のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("connection '{0}' not found")]
    ConnectionNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),

    #[error("failed to encode message: {0}")]
    EncodeFailed(String),
}
