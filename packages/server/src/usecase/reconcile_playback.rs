//! UseCase: 再生状態の定期リコンシリエーション
//!
//! 接続が 1 つ以上ある Room について、再生中なら経過時間を位置に繰り入れて
//! チェックポイントを進め、全員に syncState を配信する。停止中の Room は
//! 状態を変えずに再配信する（途中参加者が新しい基準時刻を得られるように）。
//!
//! 読み出しから配信までは Room のターンを保持するため、ホスト操作の syncState と
//! 前後が入れ替わることはない。それでも version が一致しなかった Room は今回は見送る。

use std::sync::Arc;

use sajiki_shared::time::Clock;

use crate::domain::{
    MessagePusher, PresenceRegistry, RoomEvent, RoomId, RoomRepository, Timestamp,
};

use super::{membership::room_connections, sequencer::RoomSequencer};

/// 1 回のリコンシリエーションの結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// チェックポイントを進めて配信した Room
    pub advanced: Vec<RoomId>,
    /// 停止中のため状態を変えずに再配信した Room
    pub rebroadcast: Vec<RoomId>,
    /// 競合・取得失敗で見送った Room
    pub skipped: Vec<RoomId>,
}

/// 定期リコンシリエーションのユースケース
pub struct ReconcilePlaybackUseCase {
    repository: Arc<dyn RoomRepository>,
    presence: Arc<dyn PresenceRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
    sequencer: Arc<RoomSequencer>,
    clock: Arc<dyn Clock>,
}

impl ReconcilePlaybackUseCase {
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

    /// 1 回分のリコンシリエーションを実行
    pub async fn execute(&self) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for room_id in self.presence.active_room_ids().await {
            let _turn = self.sequencer.lock(&room_id).await;
            let room = match self.repository.get(&room_id).await {
                Ok(Some(room)) => room,
                Ok(None) => {
                    report.skipped.push(room_id);
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Failed to load room '{}': {}", room_id.as_str(), e);
                    report.skipped.push(room_id);
                    continue;
                }
            };

            let now = Timestamp::new(self.clock.now_millis());
            let playback = match room.playback.reconcile(now) {
                Some(next) => {
                    match self
                        .repository
                        .update_playback(&room_id, room.playback.version, next.clone())
                        .await
                    {
                        Ok(true) => {
                            report.advanced.push(room_id.clone());
                            next
                        }
                        Ok(false) => {
                            tracing::debug!(
                                "Skipping reconciliation of room '{}': playback changed",
                                room_id.as_str()
                            );
                            report.skipped.push(room_id);
                            continue;
                        }
                        Err(e) => {
                            tracing::warn!(
                                "Failed to reconcile room '{}': {}",
                                room_id.as_str(),
                                e
                            );
                            report.skipped.push(room_id);
                            continue;
                        }
                    }
                }
                None => {
                    report.rebroadcast.push(room_id.clone());
                    room.playback
                }
            };

            let targets = room_connections(self.presence.as_ref(), &room_id, None).await;
            let event = RoomEvent::SyncState {
                playback,
                server_time: now,
            };
            if let Err(e) = self.message_pusher.broadcast(targets, &event).await {
                tracing::warn!("Failed to broadcast syncState: {}", e);
            }
        }

        if !report.advanced.is_empty() || !report.skipped.is_empty() {
            tracing::debug!(
                "Reconciled {} room(s), rebroadcast {}, skipped {}",
                report.advanced.len(),
                report.rebroadcast.len(),
                report.skipped.len()
            );
        }
        report
    }
}
