//! 送信元の接続が Room に参加しているかの確認
//!
//! Room の存在を先に確認するため、閉じられた Room への操作は
//! NotJoined ではなく NotFound になる。

use crate::domain::{
    ConnectionId, PresenceEntry, PresenceRegistry, Room, RoomId, RoomRepository,
};

use super::error::MembershipError;

/// Room と送信元の Presence を取得する
pub(crate) async fn resolve_member(
    repository: &dyn RoomRepository,
    presence: &dyn PresenceRegistry,
    connection_id: &ConnectionId,
    room_id: &RoomId,
) -> Result<(Room, PresenceEntry), MembershipError> {
    let room = repository
        .get(room_id)
        .await?
        .ok_or_else(|| MembershipError::RoomNotFound(room_id.as_str().to_string()))?;

    let entry = presence
        .find_by_connection(connection_id)
        .await
        .filter(|entry| &entry.room_id == room_id)
        .ok_or_else(|| MembershipError::NotJoined(room_id.as_str().to_string()))?;

    Ok((room, entry))
}

/// Room 内の接続 ID（`exclude` を除く）
pub(crate) async fn room_connections(
    presence: &dyn PresenceRegistry,
    room_id: &RoomId,
    exclude: Option<&ConnectionId>,
) -> Vec<ConnectionId> {
    presence
        .list_by_room(room_id)
        .await
        .into_iter()
        .map(|entry| entry.connection_id)
        .filter(|id| Some(id) != exclude)
        .collect()
}
