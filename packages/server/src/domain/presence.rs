//! Presence（接続と参加者の対応）
//!
//! Presence は生きている接続が存在する間だけ有効なエントリで、永続化されません。
//! `(room_id, user_id)` ごとに最大 1 件で、同じ user が再接続した場合は
//! 新しい接続が古い接続を置き換えます（last-socket-wins）。

use async_trait::async_trait;
use serde::Serialize;

use super::value_object::{ConnectionId, DisplayName, RoomId, Timestamp, UserId};

/// 接続中の参加者
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresenceEntry {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
    pub display_name: DisplayName,
    pub room_id: RoomId,
    pub is_host: bool,
    pub is_muted: bool,
    pub joined_at: Timestamp,
}

impl PresenceEntry {
    pub fn new(
        connection_id: ConnectionId,
        user_id: UserId,
        display_name: DisplayName,
        room_id: RoomId,
        is_host: bool,
        joined_at: Timestamp,
    ) -> Self {
        Self {
            connection_id,
            user_id,
            display_name,
            room_id,
            is_host,
            is_muted: false,
            joined_at,
        }
    }
}

/// Presence Registry trait
///
/// UseCase 層はこの trait に依存し、具体的な実装（インメモリ）には依存しない。
#[async_trait]
pub trait PresenceRegistry: Send + Sync {
    /// Presence を登録する
    ///
    /// 同じ `(room_id, user_id)` の既存エントリがあれば置き換え、置き換えられた
    /// エントリを返す。
    async fn register(&self, entry: PresenceEntry) -> Option<PresenceEntry>;

    /// 接続に紐づく Presence を削除する
    ///
    /// 既に別の接続に置き換えられている場合は何もせず `None` を返す。
    async fn unregister(&self, connection_id: &ConnectionId) -> Option<PresenceEntry>;

    /// Room 内の user の Presence を取得
    async fn find_by_user(&self, room_id: &RoomId, user_id: &UserId) -> Option<PresenceEntry>;

    /// 接続の Presence を取得
    async fn find_by_connection(&self, connection_id: &ConnectionId) -> Option<PresenceEntry>;

    /// Room 内の全 Presence を参加順に取得
    async fn list_by_room(&self, room_id: &RoomId) -> Vec<PresenceEntry>;

    /// ミュート状態を更新し、更新後のエントリを返す
    async fn set_muted(&self, connection_id: &ConnectionId, muted: bool) -> Option<PresenceEntry>;

    /// Presence が 1 件以上ある Room の ID 一覧
    async fn active_room_ids(&self) -> Vec<RoomId>;
}
