//! Shared application state.

use std::sync::Arc;

use sajiki_shared::time::Clock;

use crate::config::ServerConfig;
use crate::domain::{MessagePusher, PresenceRegistry, RoomRepository};
use crate::infrastructure::{
    message_pusher::WebSocketMessagePusher, presence::InMemoryPresenceRegistry,
    repository::InMemoryRoomRepository,
};
use crate::usecase::{
    ConnectParticipantUseCase, ControlPlaybackUseCase, CreateRoomUseCase,
    DisconnectParticipantUseCase, GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase,
    KickParticipantUseCase, ReconcilePlaybackUseCase, RelaySignalUseCase, RoomSequencer,
    SendChatUseCase, SetMutedUseCase,
};

/// Use cases shared by every handler
pub struct AppState {
    /// ConnectParticipantUseCase（接続受付のユースケース）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（接続切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// CreateRoomUseCase（Room 作成のユースケース）
    pub create_room_usecase: Arc<CreateRoomUseCase>,
    /// JoinRoomUseCase（Room 参加のユースケース）
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    /// ControlPlaybackUseCase（再生操作のユースケース）
    pub control_playback_usecase: Arc<ControlPlaybackUseCase>,
    /// ReconcilePlaybackUseCase（定期リコンシリエーションのユースケース）
    pub reconcile_playback_usecase: Arc<ReconcilePlaybackUseCase>,
    /// SendChatUseCase（チャット送信のユースケース）
    pub send_chat_usecase: Arc<SendChatUseCase>,
    /// RelaySignalUseCase（シグナリング中継のユースケース）
    pub relay_signal_usecase: Arc<RelaySignalUseCase>,
    /// KickParticipantUseCase（キックのユースケース）
    pub kick_participant_usecase: Arc<KickParticipantUseCase>,
    /// SetMutedUseCase（ミュート状態変更のユースケース）
    pub set_muted_usecase: Arc<SetMutedUseCase>,
    /// GetRoomsUseCase（Room 一覧取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// GetRoomDetailUseCase（Room 詳細取得のユースケース）
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
}

impl AppState {
    /// Wire every use case against the in-memory store, presence registry and pusher
    pub fn in_memory(config: &ServerConfig, clock: Arc<dyn Clock>) -> Self {
        // 1. Infrastructure 層の実装を生成
        let repository: Arc<dyn RoomRepository> = Arc::new(InMemoryRoomRepository::new());
        let presence: Arc<dyn PresenceRegistry> = Arc::new(InMemoryPresenceRegistry::new());
        let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new());
        let sequencer = Arc::new(RoomSequencer::new());

        // 2. UseCase を生成（依存を注入）
        Self {
            connect_participant_usecase: Arc::new(ConnectParticipantUseCase::new(
                message_pusher.clone(),
            )),
            disconnect_participant_usecase: Arc::new(DisconnectParticipantUseCase::new(
                repository.clone(),
                presence.clone(),
                message_pusher.clone(),
            )),
            create_room_usecase: Arc::new(CreateRoomUseCase::new(
                repository.clone(),
                clock.clone(),
                config.max_participants,
                config.chat_history_capacity,
            )),
            join_room_usecase: Arc::new(JoinRoomUseCase::new(
                repository.clone(),
                presence.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            control_playback_usecase: Arc::new(ControlPlaybackUseCase::new(
                repository.clone(),
                presence.clone(),
                message_pusher.clone(),
                sequencer.clone(),
                clock.clone(),
            )),
            reconcile_playback_usecase: Arc::new(ReconcilePlaybackUseCase::new(
                repository.clone(),
                presence.clone(),
                message_pusher.clone(),
                sequencer,
                clock.clone(),
            )),
            send_chat_usecase: Arc::new(SendChatUseCase::new(
                repository.clone(),
                presence.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            relay_signal_usecase: Arc::new(RelaySignalUseCase::new(
                presence.clone(),
                message_pusher.clone(),
            )),
            kick_participant_usecase: Arc::new(KickParticipantUseCase::new(
                repository.clone(),
                presence.clone(),
                message_pusher.clone(),
                clock.clone(),
            )),
            set_muted_usecase: Arc::new(SetMutedUseCase::new(
                repository.clone(),
                presence.clone(),
                message_pusher,
            )),
            get_rooms_usecase: Arc::new(GetRoomsUseCase::new(repository.clone())),
            get_room_detail_usecase: Arc::new(GetRoomDetailUseCase::new(repository)),
        }
    }
}
