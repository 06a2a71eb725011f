//! UseCase: 参加者のキック
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - KickParticipantUseCase::execute() メソッド
//! - キックされた user は 30 分間 BAN され、その間の参加は拒否されること
//!
//! ### どのような状況を想定しているか
//! - 正常系：ホストによるキック（kicked 通知、接続の切断、participantLeft）
//! - 異常系：ホスト以外のキック、存在しない参加者、ホスト自身
//! - シナリオ E：キック 10 分後の参加は「~20 分」で拒否、30 分後には参加できる

use std::sync::Arc;

use sajiki_shared::time::Clock;

use crate::domain::{
    ConnectionId, MessagePusher, PresenceRegistry, RoomEvent, RoomId, RoomRepository, Timestamp,
    UserId,
};

use super::{
    error::KickError,
    membership::{resolve_member, room_connections},
};

/// キックされた user の BAN 期間（30 分）
pub const KICK_BAN_DURATION_MS: i64 = 30 * 60 * 1000;

/// キックされた接続に送る理由
pub const KICKED_REASON: &str = "kicked by the host";

/// キックのユースケース
pub struct KickParticipantUseCase {
    repository: Arc<dyn RoomRepository>,
    presence: Arc<dyn PresenceRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl KickParticipantUseCase {
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

    /// `target` を Room から追い出し、BAN する
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
        target: UserId,
    ) -> Result<(), KickError> {
        let (room, sender) = resolve_member(
            self.repository.as_ref(),
            self.presence.as_ref(),
            connection_id,
            room_id,
        )
        .await?;

        if !room.is_host(&sender.user_id) {
            return Err(KickError::PermissionDenied);
        }
        if room.is_host(&target) {
            return Err(KickError::CannotKickHost);
        }

        let target_presence = self.presence.find_by_user(room_id, &target).await;
        if !room.has_participant(&target) && target_presence.is_none() {
            return Err(KickError::ParticipantNotFound(target.as_str().to_string()));
        }

        // 1. BAN を記録して名簿から外す
        let now = Timestamp::new(self.clock.now_millis());
        self.repository
            .ban_user(room_id, target.clone(), now, now.plus_millis(KICK_BAN_DURATION_MS))
            .await?;
        let removed = self.repository.remove_participant(room_id, &target).await?;

        // 2. キックされた接続に通知して切断する
        let display_name = match target_presence {
            Some(entry) => {
                let event = RoomEvent::Kicked {
                    reason: KICKED_REASON.to_string(),
                };
                if let Err(e) = self.message_pusher.push_to(&entry.connection_id, &event).await {
                    tracing::debug!("Could not notify kicked user: {}", e);
                }
                self.presence.unregister(&entry.connection_id).await;
                self.message_pusher
                    .unregister_client(&entry.connection_id)
                    .await;
                Some(entry.display_name)
            }
            None => removed.map(|p| p.display_name),
        };

        // 3. 残りの参加者に通知
        if let Some(display_name) = display_name {
            let targets = room_connections(self.presence.as_ref(), room_id, None).await;
            let event = RoomEvent::ParticipantLeft {
                user_id: target.clone(),
                display_name,
            };
            if let Err(e) = self.message_pusher.broadcast(targets, &event).await {
                tracing::warn!("Failed to broadcast participantLeft: {}", e);
            }
        }

        tracing::info!(
            "'{}' kicked '{}' from room '{}' (banned for {} min)",
            sender.user_id.as_str(),
            target.as_str(),
            room_id.as_str(),
            KICK_BAN_DURATION_MS / 60_000
        );
        Ok(())
    }
}
