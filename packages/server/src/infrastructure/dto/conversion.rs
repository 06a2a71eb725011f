//! Conversion logic between DTOs and domain entities.

use crate::domain::{
    ChatMessage, MediaSource, Participant, PlaybackState, PresenceEntry, Room, RoomEvent,
    SignalKind, SourceKind,
};
use crate::infrastructure::dto::{http, websocket as dto};
use sajiki_shared::time::timestamp_to_jst_rfc3339;

// ========================================
// DTO → Domain
// ========================================

impl From<dto::SourceKindDto> for SourceKind {
    fn from(kind: dto::SourceKindDto) -> Self {
        match kind {
            dto::SourceKindDto::RawFile => SourceKind::RawFile,
            dto::SourceKindDto::AdaptiveStream => SourceKind::AdaptiveStream,
            dto::SourceKindDto::EmbeddedPlatform => SourceKind::EmbeddedPlatform,
        }
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<SourceKind> for dto::SourceKindDto {
    fn from(kind: SourceKind) -> Self {
        match kind {
            SourceKind::RawFile => dto::SourceKindDto::RawFile,
            SourceKind::AdaptiveStream => dto::SourceKindDto::AdaptiveStream,
            SourceKind::EmbeddedPlatform => dto::SourceKindDto::EmbeddedPlatform,
        }
    }
}

impl From<&PlaybackState> for dto::PlaybackStateDto {
    fn from(state: &PlaybackState) -> Self {
        let MediaSource { url, kind } = &state.source;
        Self {
            source_url: url.clone(),
            source_kind: (*kind).into(),
            position_seconds: state.position_seconds,
            is_playing: state.is_playing,
            last_updated_at_ms: state.last_updated_at.value(),
            version: state.version,
        }
    }
}

impl From<&PresenceEntry> for dto::ParticipantDto {
    fn from(entry: &PresenceEntry) -> Self {
        Self {
            user_id: entry.user_id.as_str().to_string(),
            display_name: entry.display_name.as_str().to_string(),
            is_host: entry.is_host,
            is_muted: entry.is_muted,
            joined_at: entry.joined_at.value(),
        }
    }
}

impl From<&ChatMessage> for dto::ChatMessageDto {
    fn from(message: &ChatMessage) -> Self {
        Self {
            id: message.id.clone(),
            user_id: message.from.as_str().to_string(),
            display_name: message.display_name.as_str().to_string(),
            text: message.content.as_str().to_string(),
            client_message_id: message.client_message_id.clone(),
            image_ref: message.image_ref.clone(),
            sent_at: message.sent_at.value(),
        }
    }
}

impl From<&Room> for dto::RoomDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            join_code: room.join_code.as_ref().map(|code| code.as_str().to_string()),
            host_user_id: room.host.as_str().to_string(),
            max_participants: room.max_participants,
            playback: (&room.playback).into(),
            chat_history: room.messages.iter().map(Into::into).collect(),
            created_at: room.created_at.value(),
        }
    }
}

impl From<&RoomEvent> for dto::ServerMessage {
    fn from(event: &RoomEvent) -> Self {
        match event {
            RoomEvent::RoomSnapshot {
                room,
                participants,
                server_time,
            } => dto::ServerMessage::RoomState {
                room: room.into(),
                participants: participants.iter().map(Into::into).collect(),
                server_time_ms: server_time.value(),
            },
            RoomEvent::SyncState {
                playback,
                server_time,
            } => dto::ServerMessage::SyncState {
                playback: playback.into(),
                server_time_ms: server_time.value(),
            },
            RoomEvent::ParticipantJoined(entry) => {
                dto::ServerMessage::ParticipantJoined(entry.into())
            }
            RoomEvent::ParticipantLeft {
                user_id,
                display_name,
            } => dto::ServerMessage::ParticipantLeft {
                user_id: user_id.as_str().to_string(),
                display_name: display_name.as_str().to_string(),
            },
            RoomEvent::ParticipantMuted { user_id, muted } => {
                dto::ServerMessage::ParticipantMuted {
                    user_id: user_id.as_str().to_string(),
                    muted: *muted,
                }
            }
            RoomEvent::Chat(message) => dto::ServerMessage::ChatMessage(message.into()),
            RoomEvent::Signal {
                kind,
                from,
                payload,
            } => {
                let from_user_id = from.as_str().to_string();
                let payload = payload.as_value().clone();
                match kind {
                    SignalKind::Offer => dto::ServerMessage::Offer {
                        from_user_id,
                        payload,
                    },
                    SignalKind::Answer => dto::ServerMessage::Answer {
                        from_user_id,
                        payload,
                    },
                    SignalKind::IceCandidate => dto::ServerMessage::IceCandidate {
                        from_user_id,
                        payload,
                    },
                }
            }
            RoomEvent::Kicked { reason } => dto::ServerMessage::Kicked {
                reason: reason.clone(),
            },
            RoomEvent::RoomClosed { reason } => dto::ServerMessage::RoomClosed {
                reason: reason.clone(),
            },
            RoomEvent::Error { kind, message } => dto::ServerMessage::ErrorSignal {
                code: kind.as_code().to_string(),
                message: message.clone(),
            },
        }
    }
}

impl From<&Participant> for http::ParticipantDetailDto {
    fn from(participant: &Participant) -> Self {
        Self {
            user_id: participant.user_id.as_str().to_string(),
            display_name: participant.display_name.as_str().to_string(),
            joined_at: timestamp_to_jst_rfc3339(participant.joined_at.value()),
        }
    }
}

impl From<&Room> for http::RoomSummaryDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            join_code: room.join_code.as_ref().map(|code| code.as_str().to_string()),
            host_user_id: room.host.as_str().to_string(),
            participants: room
                .participants
                .iter()
                .map(|p| p.user_id.as_str().to_string())
                .collect(),
            max_participants: room.max_participants,
            is_playing: room.playback.is_playing,
            created_at: timestamp_to_jst_rfc3339(room.created_at.value()),
        }
    }
}

impl From<&Room> for http::RoomDetailDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            join_code: room.join_code.as_ref().map(|code| code.as_str().to_string()),
            host_user_id: room.host.as_str().to_string(),
            participants: room.participants.iter().map(Into::into).collect(),
            max_participants: room.max_participants,
            playback: (&room.playback).into(),
            created_at: timestamp_to_jst_rfc3339(room.created_at.value()),
        }
    }
}
