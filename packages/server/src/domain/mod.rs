//! ドメイン層
//!
//! エンティティ・値オブジェクト・ドメインイベントと、ドメインが必要とする
//! 外部への抽象（Repository / PresenceRegistry / MessagePusher）を定義します。

pub mod entity;
pub mod error;
pub mod event;
pub mod factory;
pub mod message_pusher;
pub mod playback;
pub mod presence;
pub mod repository;
pub mod value_object;

pub use entity::{
    ChatMessage, DEFAULT_CHAT_HISTORY_CAPACITY, DEFAULT_MAX_PARTICIPANTS, Participant, Room,
};
pub use error::{MessagePushError, RepositoryError, RoomError, ValueObjectError};
pub use event::{ErrorKind, RoomEvent, SignalKind, SignalPayload};
pub use factory::{JoinCodeFactory, RoomIdFactory};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use playback::{MediaSource, PlaybackIntent, PlaybackState, SourceKind};
pub use presence::{PresenceEntry, PresenceRegistry};
pub use repository::RoomRepository;
pub use value_object::{
    ConnectionId, DisplayName, JoinCode, MessageContent, RoomId, Timestamp, UserId,
};

#[cfg(test)]
pub use message_pusher::MockMessagePusher;
#[cfg(test)]
pub use repository::MockRoomRepository;
