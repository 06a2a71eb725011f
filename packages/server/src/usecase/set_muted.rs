//! UseCase: ミュート状態の変更
//!
//! 音声そのものは P2P で流れるため、サーバーは状態を Presence に記録して
//! Room 全体に知らせるだけ。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, MessagePusher, PresenceEntry, PresenceRegistry, RoomEvent, RoomId,
    RoomRepository,
};

use super::{
    error::MembershipError,
    membership::{resolve_member, room_connections},
};

/// ミュート状態変更のユースケース
pub struct SetMutedUseCase {
    repository: Arc<dyn RoomRepository>,
    presence: Arc<dyn PresenceRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl SetMutedUseCase {
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

    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
        muted: bool,
    ) -> Result<PresenceEntry, MembershipError> {
        resolve_member(
            self.repository.as_ref(),
            self.presence.as_ref(),
            connection_id,
            room_id,
        )
        .await?;

        let entry = self
            .presence
            .set_muted(connection_id, muted)
            .await
            .ok_or_else(|| MembershipError::NotJoined(room_id.as_str().to_string()))?;

        let targets = room_connections(self.presence.as_ref(), room_id, None).await;
        let event = RoomEvent::ParticipantMuted {
            user_id: entry.user_id.clone(),
            muted,
        };
        if let Err(e) = self.message_pusher.broadcast(targets, &event).await {
            tracing::warn!("Failed to broadcast participantMuted: {}", e);
        }
        Ok(entry)
    }
}
