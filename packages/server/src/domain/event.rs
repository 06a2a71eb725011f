//! クライアントへ通知するイベント
//!
//! UseCase 層はこのドメインイベントを組み立てて MessagePusher に渡すだけで、
//! ワイヤーフォーマット（JSON）への変換は Infrastructure 層の DTO が担う。

use serde_json::Value;

use super::{
    ChatMessage, PlaybackState, PresenceEntry, Room, Timestamp, UserId, value_object::DisplayName,
};

/// シグナリングメッセージの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::IceCandidate => "iceCandidate",
        }
    }
}

/// シグナリングのペイロード
///
/// 中身（SDP / ICE candidate）は一切解釈せず、受け取った JSON をそのまま転送する。
#[derive(Debug, Clone, PartialEq)]
pub struct SignalPayload(Value);

impl SignalPayload {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// エラー通知の分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    PermissionDenied,
    NotFound,
    Capacity,
    TemporarilyBanned,
    TransportFailure,
    InvalidInput,
    NotJoined,
    AlreadyJoined,
    SessionReplaced,
}

impl ErrorKind {
    pub fn as_code(&self) -> &'static str {
        match self {
            ErrorKind::PermissionDenied => "permissionDenied",
            ErrorKind::NotFound => "notFound",
            ErrorKind::Capacity => "roomFull",
            ErrorKind::TemporarilyBanned => "temporarilyBanned",
            ErrorKind::TransportFailure => "transportFailure",
            ErrorKind::InvalidInput => "invalidInput",
            ErrorKind::NotJoined => "notJoined",
            ErrorKind::AlreadyJoined => "alreadyJoined",
            ErrorKind::SessionReplaced => "sessionReplaced",
        }
    }
}

/// クライアントへ通知するイベント
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    /// 参加直後に 1 回だけ送る Room 全体のスナップショット
    RoomSnapshot {
        room: Room,
        participants: Vec<PresenceEntry>,
        server_time: Timestamp,
    },
    /// 権威ある再生状態（変更のたび・リコンシリエーションのたびに送る）
    SyncState {
        playback: PlaybackState,
        server_time: Timestamp,
    },
    ParticipantJoined(PresenceEntry),
    ParticipantLeft {
        user_id: UserId,
        display_name: DisplayName,
    },
    ParticipantMuted {
        user_id: UserId,
        muted: bool,
    },
    Chat(ChatMessage),
    Signal {
        kind: SignalKind,
        from: UserId,
        payload: SignalPayload,
    },
    Kicked {
        reason: String,
    },
    RoomClosed {
        reason: String,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
}

impl RoomEvent {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        RoomEvent::Error {
            kind,
            message: message.into(),
        }
    }

    /// ログ出力用のイベント名
    pub fn name(&self) -> &'static str {
        match self {
            RoomEvent::RoomSnapshot { .. } => "roomState",
            RoomEvent::SyncState { .. } => "syncState",
            RoomEvent::ParticipantJoined(_) => "participantJoined",
            RoomEvent::ParticipantLeft { .. } => "participantLeft",
            RoomEvent::ParticipantMuted { .. } => "participantMuted",
            RoomEvent::Chat(_) => "chatMessage",
            RoomEvent::Signal { kind, .. } => kind.as_str(),
            RoomEvent::Kicked { .. } => "kicked",
            RoomEvent::RoomClosed { .. } => "roomClosed",
            RoomEvent::Error { .. } => "errorSignal",
        }
    }
}
