//! UseCase: 接続の切断
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 参加者の退出通知と、ホスト切断時の Room 終了
//!
//! ### なぜこのテストが必要か
//! - ホストが抜けた Room は引き継ぎなしで閉じる必要がある
//! - 置き換えられた古い接続の切断で、新しい接続の Presence が消えてはいけない
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加者の切断と participantLeft の通知
//! - 正常系：ホストの切断で roomClosed が全員に届き、以後の操作は NotFound
//! - エッジケース：Room に参加していない接続の切断、置き換え済み接続の切断

use std::sync::Arc;

use crate::domain::{
    ConnectionId, MessagePusher, PresenceEntry, PresenceRegistry, RoomEvent, RoomId,
    RoomRepository,
};

use super::membership::room_connections;

/// ホスト切断で Room が閉じたときの理由
pub const HOST_LEFT_REASON: &str = "host left the room";

/// 切断処理の結果
#[derive(Debug, Clone, PartialEq)]
pub enum DisconnectOutcome {
    /// Room に参加していなかった（または既に置き換えられていた）
    Detached,
    /// 参加者が退出した
    Left(PresenceEntry),
    /// ホストが抜けたため Room を閉じた
    RoomClosed { room_id: RoomId, notified: usize },
}

/// 接続切断のユースケース
pub struct DisconnectParticipantUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// Presence Registry（接続と参加者の対応）
    presence: Arc<dyn PresenceRegistry>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectParticipantUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        presence: Arc<dyn PresenceRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            presence,
            message_pusher,
        }
    }

    /// 接続切断を実行
    ///
    /// 送信チャンネルを登録解除し、Presence が残っていれば退出（またはホストなら
    /// Room の終了）を通知する。ストアの失敗はログに残し、切断処理は続行する。
    pub async fn execute(&self, connection_id: &ConnectionId) -> DisconnectOutcome {
        self.message_pusher.unregister_client(connection_id).await;

        let Some(entry) = self.presence.unregister(connection_id).await else {
            tracing::debug!(
                "Connection '{}' disconnected without an active presence",
                connection_id.as_str()
            );
            return DisconnectOutcome::Detached;
        };

        if entry.is_host {
            return self.close_room(&entry).await;
        }

        if let Err(e) = self
            .repository
            .remove_participant(&entry.room_id, &entry.user_id)
            .await
        {
            tracing::warn!(
                "Failed to remove '{}' from room '{}': {}",
                entry.user_id.as_str(),
                entry.room_id.as_str(),
                e
            );
        }

        let targets = room_connections(self.presence.as_ref(), &entry.room_id, None).await;
        let event = RoomEvent::ParticipantLeft {
            user_id: entry.user_id.clone(),
            display_name: entry.display_name.clone(),
        };
        if let Err(e) = self.message_pusher.broadcast(targets, &event).await {
            tracing::warn!("Failed to broadcast participantLeft: {}", e);
        }

        tracing::info!(
            "'{}' left room '{}'",
            entry.user_id.as_str(),
            entry.room_id.as_str()
        );
        DisconnectOutcome::Left(entry)
    }

    /// ホストの切断で Room を閉じる
    ///
    /// 残りの参加者の Presence も外すため、以後の操作は NotFound になる。
    /// 送信チャンネルは残すので、接続はクライアント側から閉じられるまで続く。
    async fn close_room(&self, host: &PresenceEntry) -> DisconnectOutcome {
        let room_id = host.room_id.clone();

        if let Err(e) = self.repository.remove(&room_id).await {
            tracing::warn!("Failed to remove room '{}': {}", room_id.as_str(), e);
        }

        let remaining = self.presence.list_by_room(&room_id).await;
        let mut targets = Vec::with_capacity(remaining.len());
        for entry in remaining {
            self.presence.unregister(&entry.connection_id).await;
            targets.push(entry.connection_id);
        }

        let notified = targets.len();
        let event = RoomEvent::RoomClosed {
            reason: HOST_LEFT_REASON.to_string(),
        };
        if let Err(e) = self.message_pusher.broadcast(targets, &event).await {
            tracing::warn!("Failed to broadcast roomClosed: {}", e);
        }

        tracing::info!(
            "Room '{}' closed because host '{}' left ({} participant(s) notified)",
            room_id.as_str(),
            host.user_id.as_str(),
            notified
        );
        DisconnectOutcome::RoomClosed { room_id, notified }
    }
}
