//! UseCase: 再生操作（同期エンジン）
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ControlPlaybackUseCase::execute() / request_sync()
//! - ホストだけが再生状態を変更でき、変更のたびに syncState が全員に届くこと
//! - version 照合に失敗した場合の再試行
//!
//! ### どのような状況を想定しているか
//! - 正常系：play / pause / seek / changeSource
//! - 異常系：ホスト以外の操作、存在しない Room、未参加の接続、不正な位置
//! - エッジケース：シナリオ B（再生中の seek 直後の pause）、書き込み競合の連続、
//!   リコンシリエーションと重なった場合の配信順

use std::sync::Arc;

use sajiki_shared::time::Clock;

use crate::domain::{
    ConnectionId, MessagePusher, PlaybackIntent, PlaybackState, PresenceRegistry, RoomEvent,
    RoomId, RoomRepository, Timestamp,
};

use super::{
    error::SyncError,
    membership::{resolve_member, room_connections},
    sequencer::RoomSequencer,
};

/// version 照合に失敗したときに読み直して再試行する回数
pub const MAX_PLAYBACK_ATTEMPTS: usize = 3;

/// 再生操作のユースケース
pub struct ControlPlaybackUseCase {
    repository: Arc<dyn RoomRepository>,
    presence: Arc<dyn PresenceRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
    sequencer: Arc<RoomSequencer>,
    clock: Arc<dyn Clock>,
}

impl ControlPlaybackUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        presence: Arc<dyn PresenceRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        sequencer: Arc<RoomSequencer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            presence,
            message_pusher,
            sequencer,
            clock,
        }
    }

    /// ホストの再生操作を適用し、結果の状態を Room 全体に配信する
    ///
    /// 毎回 Room を読み直し、読み出した version を前提に書き込む。
    /// 他の書き込みと競合した場合は読み直して再試行する。
    /// 書き込みから配信までは Room のターンを保持したまま行う。
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
        intent: PlaybackIntent,
    ) -> Result<PlaybackState, SyncError> {
        let _turn = self.sequencer.lock(room_id).await;

        for attempt in 1..=MAX_PLAYBACK_ATTEMPTS {
            let (room, sender) = resolve_member(
                self.repository.as_ref(),
                self.presence.as_ref(),
                connection_id,
                room_id,
            )
            .await?;

            if !room.is_host(&sender.user_id) {
                tracing::info!(
                    "Rejected '{}' from non-host '{}' in room '{}'",
                    intent.name(),
                    sender.user_id.as_str(),
                    room_id.as_str()
                );
                return Err(SyncError::PermissionDenied(intent.name()));
            }

            let now = Timestamp::new(self.clock.now_millis());
            let next = intent.apply(&room.playback, now)?;

            let written = self
                .repository
                .update_playback(room_id, room.playback.version, next.clone())
                .await?;
            if written {
                tracing::info!(
                    "Room '{}': {} -> position {:.3}s, playing={}, version {}",
                    room_id.as_str(),
                    intent.name(),
                    next.position_seconds,
                    next.is_playing,
                    next.version
                );
                self.broadcast_state(room_id, &next, now).await;
                return Ok(next);
            }

            tracing::debug!(
                "Playback of room '{}' changed concurrently (attempt {}/{})",
                room_id.as_str(),
                attempt,
                MAX_PLAYBACK_ATTEMPTS
            );
        }

        tracing::warn!(
            "Giving up '{}' on room '{}' after {} attempts",
            intent.name(),
            room_id.as_str(),
            MAX_PLAYBACK_ATTEMPTS
        );
        Err(SyncError::Conflict(room_id.as_str().to_string()))
    }

    /// 現在の再生状態を要求元の接続にだけ送る
    pub async fn request_sync(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) -> Result<PlaybackState, SyncError> {
        let _turn = self.sequencer.lock(room_id).await;
        let (room, _sender) = resolve_member(
            self.repository.as_ref(),
            self.presence.as_ref(),
            connection_id,
            room_id,
        )
        .await?;

        let event = RoomEvent::SyncState {
            playback: room.playback.clone(),
            server_time: Timestamp::new(self.clock.now_millis()),
        };
        if let Err(e) = self.message_pusher.push_to(connection_id, &event).await {
            tracing::warn!(
                "Failed to send sync state to connection '{}': {}",
                connection_id.as_str(),
                e
            );
        }
        Ok(room.playback)
    }

    async fn broadcast_state(&self, room_id: &RoomId, playback: &PlaybackState, now: Timestamp) {
        let targets = room_connections(self.presence.as_ref(), room_id, None).await;
        let event = RoomEvent::SyncState {
            playback: playback.clone(),
            server_time: now,
        };
        if let Err(e) = self.message_pusher.broadcast(targets, &event).await {
            tracing::warn!("Failed to broadcast syncState: {}", e);
        }
    }
}
