//! UseCase 層のエラー定義
//!
//! 各エラーは `kind()` でクライアントへ返す `ErrorKind` に対応付けられ、
//! `errorSignal` の `code` として送信されます。

use thiserror::Error;

use crate::domain::{ErrorKind, RepositoryError, RoomError, ValueObjectError};

/// 送信元の接続が Room のメンバーかどうかの確認に失敗
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MembershipError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),

    #[error("connection has not joined room '{0}'")]
    NotJoined(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl MembershipError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MembershipError::RoomNotFound(_) => ErrorKind::NotFound,
            MembershipError::NotJoined(_) => ErrorKind::NotJoined,
            MembershipError::Repository(e) => repository_kind(e),
        }
    }
}

fn repository_kind(error: &RepositoryError) -> ErrorKind {
    match error {
        RepositoryError::RoomNotFound(_) => ErrorKind::NotFound,
        RepositoryError::Rejected(RoomError::RoomFull { .. }) => ErrorKind::Capacity,
        RepositoryError::Rejected(RoomError::ParticipantNotFound(_)) => ErrorKind::NotFound,
        RepositoryError::Rejected(RoomError::InvalidPosition(_)) => ErrorKind::InvalidInput,
        RepositoryError::Unavailable(_) => ErrorKind::TransportFailure,
    }
}

/// Room 作成のエラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CreateRoomError {
    #[error("max participants must be at least 1")]
    InvalidCapacity,

    #[error("could not allocate a unique join code")]
    JoinCodeExhausted,

    #[error(transparent)]
    InvalidValue(#[from] ValueObjectError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl CreateRoomError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CreateRoomError::InvalidCapacity | CreateRoomError::InvalidValue(_) => {
                ErrorKind::InvalidInput
            }
            CreateRoomError::JoinCodeExhausted => ErrorKind::TransportFailure,
            CreateRoomError::Repository(e) => repository_kind(e),
        }
    }
}

/// Room 参加のエラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum JoinRoomError {
    #[error("room '{0}' not found")]
    RoomNotFound(String),

    #[error("connection has already joined room '{0}'")]
    AlreadyJoined(String),

    #[error("you are temporarily banned from this room, try again in ~{remaining_minutes} minutes")]
    Banned { remaining_minutes: i64 },

    #[error("room is full (max {max} participants)")]
    RoomFull { max: usize },

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for JoinRoomError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::RoomNotFound(room_id) => JoinRoomError::RoomNotFound(room_id),
            RepositoryError::Rejected(RoomError::RoomFull { max }) => {
                JoinRoomError::RoomFull { max }
            }
            other => JoinRoomError::Repository(other),
        }
    }
}

impl JoinRoomError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            JoinRoomError::RoomNotFound(_) => ErrorKind::NotFound,
            JoinRoomError::AlreadyJoined(_) => ErrorKind::AlreadyJoined,
            JoinRoomError::Banned { .. } => ErrorKind::TemporarilyBanned,
            JoinRoomError::RoomFull { .. } => ErrorKind::Capacity,
            JoinRoomError::Repository(e) => repository_kind(e),
        }
    }
}

/// 再生操作（同期エンジン）のエラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    #[error(transparent)]
    Membership(#[from] MembershipError),

    #[error("only the host can {0}")]
    PermissionDenied(&'static str),

    #[error(transparent)]
    InvalidIntent(#[from] RoomError),

    #[error("playback of room '{0}' kept changing, giving up")]
    Conflict(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Membership(e) => e.kind(),
            SyncError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            SyncError::InvalidIntent(_) => ErrorKind::InvalidInput,
            SyncError::Conflict(_) => ErrorKind::TransportFailure,
            SyncError::Repository(e) => repository_kind(e),
        }
    }
}

/// チャットのエラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChatError {
    #[error(transparent)]
    Membership(#[from] MembershipError),

    #[error("message must not be empty")]
    EmptyMessage,

    #[error(transparent)]
    InvalidContent(#[from] ValueObjectError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ChatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChatError::Membership(e) => e.kind(),
            ChatError::EmptyMessage | ChatError::InvalidContent(_) => ErrorKind::InvalidInput,
            ChatError::Repository(e) => repository_kind(e),
        }
    }
}

/// キックのエラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KickError {
    #[error(transparent)]
    Membership(#[from] MembershipError),

    #[error("only the host can kick participants")]
    PermissionDenied,

    #[error("the host cannot kick themselves")]
    CannotKickHost,

    #[error("participant '{0}' is not in the room")]
    ParticipantNotFound(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl KickError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            KickError::Membership(e) => e.kind(),
            KickError::PermissionDenied => ErrorKind::PermissionDenied,
            KickError::CannotKickHost => ErrorKind::InvalidInput,
            KickError::ParticipantNotFound(_) => ErrorKind::NotFound,
            KickError::Repository(e) => repository_kind(e),
        }
    }
}

/// シグナリング中継のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    #[error("connection has not joined room '{0}'")]
    NotJoined(String),
}

impl SignalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SignalError::NotJoined(_) => ErrorKind::NotJoined,
        }
    }
}

/// Room 詳細取得のエラー
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GetRoomDetailError {
    #[error("room not found")]
    RoomNotFound,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ban_message_includes_remaining_minutes() {
        // テスト項目: BAN エラーのメッセージに残り時間（分）が含まれる
        // given (前提条件):
        let error = JoinRoomError::Banned {
            remaining_minutes: 20,
        };

        // when (操作):
        let message = error.to_string();

        // then (期待する結果):
        assert!(message.contains("try again in ~20 minutes"));
        assert_eq!(error.kind().as_code(), "temporarilyBanned");
    }

    #[test]
    fn test_room_full_from_repository() {
        // テスト項目: Repository の定員超過は JoinRoomError::RoomFull に変換される
        // when (操作):
        let error: JoinRoomError = RepositoryError::Rejected(RoomError::RoomFull { max: 3 }).into();

        // then (期待する結果):
        assert_eq!(error, JoinRoomError::RoomFull { max: 3 });
        assert_eq!(error.kind(), ErrorKind::Capacity);
    }

    #[test]
    fn test_membership_kind_is_forwarded() {
        // テスト項目: メンバー確認の失敗は各 UseCase エラーでも同じ code になる
        // given (前提条件):
        let not_found = MembershipError::RoomNotFound("r1".to_string());
        let not_joined = MembershipError::NotJoined("r1".to_string());

        // then (期待する結果):
        assert_eq!(SyncError::from(not_found.clone()).kind(), ErrorKind::NotFound);
        assert_eq!(ChatError::from(not_joined.clone()).kind(), ErrorKind::NotJoined);
        assert_eq!(KickError::from(not_found).kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_invalid_position_is_invalid_input() {
        // テスト項目: 不正な再生位置は invalidInput として返る
        let error = SyncError::from(RoomError::InvalidPosition(f64::NAN));
        assert_eq!(error.kind().as_code(), "invalidInput");
    }
}
