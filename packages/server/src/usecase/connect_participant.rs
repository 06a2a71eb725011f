//! UseCase: 接続の受付
//!
//! WebSocket 接続ごとに ConnectionId を発行し、送信チャンネルを MessagePusher に
//! 登録します。Room への参加は `join` メッセージ（JoinRoomUseCase）で行います。

use std::sync::Arc;

use crate::domain::{ConnectionId, ErrorKind, MessagePusher, PusherChannel, RoomEvent};

/// 接続受付のユースケース
pub struct ConnectParticipantUseCase {
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConnectParticipantUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// 接続を登録し、発行した ConnectionId を返す
    pub async fn execute(&self, sender: PusherChannel) -> ConnectionId {
        let connection_id = ConnectionId::generate();
        self.message_pusher
            .register_client(connection_id.clone(), sender)
            .await;
        connection_id
    }

    /// 送信元の接続にだけエラーを通知する
    pub async fn notify_error(
        &self,
        connection_id: &ConnectionId,
        kind: ErrorKind,
        message: impl Into<String>,
    ) {
        let event = RoomEvent::error(kind, message);
        if let Err(e) = self.message_pusher.push_to(connection_id, &event).await {
            tracing::warn!(
                "Failed to notify error to connection '{}': {}",
                connection_id.as_str(),
                e
            );
        }
    }
}
