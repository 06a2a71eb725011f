//! Error types for the watch-together client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The host removed us from the room
    #[error("Kicked from the room: {0}")]
    Kicked(String),

    /// Join refused because of an active ban
    #[error("{0}")]
    Banned(String),

    /// The host left and the room no longer exists
    #[error("Room closed: {0}")]
    RoomClosed(String),

    #[error("Room not found: {0}")]
    RoomNotFound(String),

    #[error("Room is full: {0}")]
    RoomFull(String),

    /// The same user joined from another connection
    #[error("Session replaced by another connection")]
    SessionReplaced,
}

/// Errors while parsing an input line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '/{0}' (type /help)")]
    Unknown(String),

    #[error("/{command} needs {expected}")]
    MissingArgument {
        command: &'static str,
        expected: &'static str,
    },

    #[error("'{0}' is not a number")]
    InvalidNumber(String),

    #[error("unknown source kind '{0}' (raw-file, adaptive-stream, embedded-platform)")]
    InvalidSourceKind(String),
}
