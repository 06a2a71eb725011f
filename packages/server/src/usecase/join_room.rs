//! UseCase: Room への参加
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//! - 定員・BAN・二重参加のチェック、参加者への通知、再接続時の置き換え
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加者に roomState、他の参加者に participantJoined が届く
//! - 異常系：存在しない Room、定員超過、BAN 中、同じ接続での二重参加
//! - エッジケース：定員ちょうど、同じ user の再接続（last-socket-wins）

use std::sync::Arc;

use sajiki_shared::time::Clock;

use crate::domain::{
    ConnectionId, DisplayName, ErrorKind, MessagePusher, Participant, PresenceEntry,
    PresenceRegistry, RoomEvent, RoomId, RoomRepository, Timestamp, UserId,
};

use super::{error::JoinRoomError, membership::room_connections};

const MILLIS_PER_MINUTE: i64 = 60_000;

/// 置き換えられた古い接続に送るメッセージ
pub const SESSION_REPLACED_MESSAGE: &str = "replaced by a newer connection of the same user";

/// Room 参加のユースケース
pub struct JoinRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    presence: Arc<dyn PresenceRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl JoinRoomUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        presence: Arc<dyn PresenceRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            presence,
            message_pusher,
            clock,
        }
    }

    /// Room への参加を実行
    ///
    /// # Returns
    ///
    /// * `Ok(PresenceEntry)` - 登録された Presence
    /// * `Err(JoinRoomError)` - 参加失敗（状態は変更されない）
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        room_id: RoomId,
        user_id: UserId,
        display_name: DisplayName,
    ) -> Result<PresenceEntry, JoinRoomError> {
        // 1. Room の存在確認
        let room = self
            .repository
            .get(&room_id)
            .await?
            .ok_or_else(|| JoinRoomError::RoomNotFound(room_id.as_str().to_string()))?;

        // 2. 同じ接続での二重参加は拒否
        if let Some(existing) = self.presence.find_by_connection(&connection_id).await {
            return Err(JoinRoomError::AlreadyJoined(
                existing.room_id.as_str().to_string(),
            ));
        }

        // 3. BAN チェック
        let now = Timestamp::new(self.clock.now_millis());
        if let Some(remaining) = room.ban_remaining_millis(&user_id, now) {
            let remaining_minutes = (remaining + MILLIS_PER_MINUTE - 1) / MILLIS_PER_MINUTE;
            tracing::info!(
                "Rejected join of banned user '{}' to room '{}' ({} min left)",
                user_id.as_str(),
                room_id.as_str(),
                remaining_minutes
            );
            return Err(JoinRoomError::Banned { remaining_minutes });
        }

        // 4. 名簿に追加（定員チェックは Room が行う、再参加は定員の対象外）
        self.repository
            .add_participant(
                &room_id,
                Participant::new(user_id.clone(), display_name.clone(), now),
            )
            .await?;

        // 5. Presence を登録（同じ user の古い接続は置き換える）
        let is_host = room.is_host(&user_id);
        let entry = PresenceEntry::new(
            connection_id.clone(),
            user_id,
            display_name,
            room_id.clone(),
            is_host,
            now,
        );
        let replaced = self.presence.register(entry.clone()).await;
        if let Some(old) = &replaced {
            self.detach_replaced(old).await;
        }

        // 6. 参加者に Room 全体のスナップショットを送る
        let snapshot_room = self
            .repository
            .get(&room_id)
            .await?
            .ok_or_else(|| JoinRoomError::RoomNotFound(room_id.as_str().to_string()))?;
        let snapshot = RoomEvent::RoomSnapshot {
            room: snapshot_room,
            participants: self.presence.list_by_room(&room_id).await,
            server_time: Timestamp::new(self.clock.now_millis()),
        };
        if let Err(e) = self.message_pusher.push_to(&connection_id, &snapshot).await {
            tracing::warn!(
                "Failed to send room state to connection '{}': {}",
                connection_id.as_str(),
                e
            );
        }

        // 7. 他の参加者に通知（再接続の場合は既に参加者として知られている）
        if replaced.is_none() {
            let targets =
                room_connections(self.presence.as_ref(), &room_id, Some(&connection_id)).await;
            let event = RoomEvent::ParticipantJoined(entry.clone());
            if let Err(e) = self.message_pusher.broadcast(targets, &event).await {
                tracing::warn!("Failed to broadcast participantJoined: {}", e);
            }
        }

        tracing::info!(
            "'{}' joined room '{}'{}",
            entry.user_id.as_str(),
            room_id.as_str(),
            if entry.is_host { " as host" } else { "" }
        );
        Ok(entry)
    }

    /// 置き換えられた古い接続に通知し、送信チャンネルを閉じる
    async fn detach_replaced(&self, old: &PresenceEntry) {
        let event = RoomEvent::error(ErrorKind::SessionReplaced, SESSION_REPLACED_MESSAGE);
        if let Err(e) = self.message_pusher.push_to(&old.connection_id, &event).await {
            tracing::debug!(
                "Could not notify replaced connection '{}': {}",
                old.connection_id.as_str(),
                e
            );
        }
        self.message_pusher
            .unregister_client(&old.connection_id)
            .await;
    }
}
