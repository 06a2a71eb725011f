//! WebSocket message DTOs.
//!
//! Every frame is a JSON object tagged by `"type"`; field names are camelCase.
//! These types are shared with the client crate.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Media kind on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKindDto {
    #[default]
    RawFile,
    AdaptiveStream,
    EmbeddedPlatform,
}

/// Client → Server intents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    Join {
        room_id: String,
        user_id: String,
        display_name: String,
    },
    Play {
        room_id: String,
    },
    Pause {
        room_id: String,
        position_seconds: f64,
    },
    Seek {
        room_id: String,
        position_seconds: f64,
    },
    ChangeSource {
        room_id: String,
        url: String,
        kind: SourceKindDto,
    },
    Chat {
        room_id: String,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        client_message_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_ref: Option<String>,
    },
    Offer {
        room_id: String,
        payload: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_user_id: Option<String>,
    },
    Answer {
        room_id: String,
        payload: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_user_id: Option<String>,
    },
    IceCandidate {
        room_id: String,
        payload: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_user_id: Option<String>,
    },
    Kick {
        room_id: String,
        user_id: String,
    },
    SetMuted {
        room_id: String,
        muted: bool,
    },
    RequestSync {
        room_id: String,
    },
}

/// Authoritative playback state on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStateDto {
    pub source_url: String,
    pub source_kind: SourceKindDto,
    pub position_seconds: f64,
    pub is_playing: bool,
    pub last_updated_at_ms: i64,
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub user_id: String,
    pub display_name: String,
    pub is_host: bool,
    pub is_muted: bool,
    pub joined_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageDto {
    pub id: String,
    pub user_id: String,
    pub display_name: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    pub sent_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDto {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_code: Option<String>,
    pub host_user_id: String,
    pub max_participants: usize,
    pub playback: PlaybackStateDto,
    pub chat_history: Vec<ChatMessageDto>,
    pub created_at: i64,
}

/// Server → Client events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    RoomState {
        room: RoomDto,
        participants: Vec<ParticipantDto>,
        server_time_ms: i64,
    },
    SyncState {
        playback: PlaybackStateDto,
        server_time_ms: i64,
    },
    ParticipantJoined(ParticipantDto),
    ParticipantLeft {
        user_id: String,
        display_name: String,
    },
    ParticipantMuted {
        user_id: String,
        muted: bool,
    },
    ChatMessage(ChatMessageDto),
    Offer {
        from_user_id: String,
        payload: Value,
    },
    Answer {
        from_user_id: String,
        payload: Value,
    },
    IceCandidate {
        from_user_id: String,
        payload: Value,
    },
    Kicked {
        reason: String,
    },
    RoomClosed {
        reason: String,
    },
    ErrorSignal {
        code: String,
        message: String,
    },
}
