//! UseCase: シグナリング中継
//!
//! offer / answer / iceCandidate を 2 人の参加者の間で中継する。
//! ペイロードは中身を見ずにそのまま転送し、Room の状態には触れない。
//!
//! - 宛先あり: `(room_id, target)` の Presence にだけ送る。見つからなければ破棄
//! - 宛先なしの offer: 送信者以外の全員に送る
//! - 宛先なしの answer / iceCandidate: 破棄

use std::sync::Arc;

use crate::domain::{
    ConnectionId, MessagePusher, PresenceRegistry, RoomEvent, RoomId, SignalKind, SignalPayload,
    UserId,
};

use super::{error::SignalError, membership::room_connections};

/// シグナリング中継のユースケース
pub struct RelaySignalUseCase {
    presence: Arc<dyn PresenceRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl RelaySignalUseCase {
    pub fn new(
        presence: Arc<dyn PresenceRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            presence,
            message_pusher,
        }
    }

    /// シグナリングメッセージを中継し、転送した接続数を返す
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
        kind: SignalKind,
        payload: SignalPayload,
        target: Option<UserId>,
    ) -> Result<usize, SignalError> {
        let sender = self
            .presence
            .find_by_connection(connection_id)
            .await
            .filter(|entry| &entry.room_id == room_id)
            .ok_or_else(|| SignalError::NotJoined(room_id.as_str().to_string()))?;

        let targets = match (&target, kind) {
            (Some(target), _) => match self.presence.find_by_user(room_id, target).await {
                Some(entry) => vec![entry.connection_id],
                None => {
                    tracing::debug!(
                        "Dropping {} from '{}': '{}' is not in room '{}'",
                        kind.as_str(),
                        sender.user_id.as_str(),
                        target.as_str(),
                        room_id.as_str()
                    );
                    return Ok(0);
                }
            },
            (None, SignalKind::Offer) => {
                room_connections(self.presence.as_ref(), room_id, Some(connection_id)).await
            }
            (None, _) => {
                tracing::debug!(
                    "Dropping {} from '{}' without a target",
                    kind.as_str(),
                    sender.user_id.as_str()
                );
                return Ok(0);
            }
        };

        let delivered = targets.len();
        let event = RoomEvent::Signal {
            kind,
            from: sender.user_id,
            payload,
        };
        if let Err(e) = self.message_pusher.broadcast(targets, &event).await {
            tracing::warn!("Failed to relay {}: {}", kind.as_str(), e);
        }
        Ok(delivered)
    }
}
