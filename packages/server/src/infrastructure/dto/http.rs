//! HTTP API request/response DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::PlaybackStateDto;

/// `POST /api/rooms` request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequestDto {
    pub host_user_id: String,
    #[serde(default)]
    pub max_participants: Option<usize>,
    #[serde(default)]
    pub with_join_code: bool,
}

/// `POST /api/rooms` response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponseDto {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_code: Option<String>,
    pub host_user_id: String,
    pub max_participants: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_code: Option<String>,
    pub host_user_id: String,
    pub participants: Vec<String>,
    pub max_participants: usize,
    pub is_playing: bool,
    /// JST (RFC 3339)
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDetailDto {
    pub user_id: String,
    pub display_name: String,
    /// JST (RFC 3339)
    pub joined_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_code: Option<String>,
    pub host_user_id: String,
    pub participants: Vec<ParticipantDetailDto>,
    pub max_participants: usize,
    pub playback: PlaybackStateDto,
    /// JST (RFC 3339)
    pub created_at: String,
}

/// Error body returned by HTTP endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponseDto {
    pub code: String,
    pub message: String,
}
