//! Domain logic for client-side operations.
//!
//! This module contains pure functions that implement business logic
//! without side effects, making them easy to test.

use crate::error::ClientError;

/// Check if the client should exit immediately based on the error type.
///
/// Rejections by the server (kick, ban, closed or missing room, replaced
/// session) would only repeat on reconnect.
pub fn should_exit_immediately(error: &ClientError) -> bool {
    !matches!(error, ClientError::ConnectionError(_))
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    // Don't reconnect if the error requires immediate exit
    if should_exit_immediately(error) {
        return false;
    }

    // Don't reconnect if we've exhausted all attempts
    current_attempt < max_attempts
}

/// Map an `errorSignal` received before the join completed to a fatal error
///
/// Returns `None` for codes the session can survive.
pub fn join_rejection(code: &str, message: &str) -> Option<ClientError> {
    match code {
        "temporarilyBanned" => Some(ClientError::Banned(message.to_string())),
        "notFound" => Some(ClientError::RoomNotFound(message.to_string())),
        "roomFull" => Some(ClientError::RoomFull(message.to_string())),
        "sessionReplaced" => Some(ClientError::SessionReplaced),
        _ => None,
    }
}
