//! UseCase 層
//!
//! 1 つの操作につき 1 つの構造体。依存（Repository / PresenceRegistry /
//! MessagePusher / Clock）はすべて trait object として注入する。

pub mod connect_participant;
pub mod control_playback;
pub mod create_room;
pub mod disconnect_participant;
pub mod error;
pub mod get_room_detail;
pub mod get_rooms;
pub mod join_room;
pub mod kick_participant;
mod membership;
pub mod reconcile_playback;
pub mod relay_signal;
pub mod send_chat;
pub mod sequencer;
pub mod set_muted;

#[cfg(test)]
pub(crate) mod test_support;

pub use connect_participant::ConnectParticipantUseCase;
pub use control_playback::{ControlPlaybackUseCase, MAX_PLAYBACK_ATTEMPTS};
pub use create_room::CreateRoomUseCase;
pub use disconnect_participant::{DisconnectOutcome, DisconnectParticipantUseCase};
pub use error::{
    ChatError, CreateRoomError, GetRoomDetailError, JoinRoomError, KickError, MembershipError,
    SignalError, SyncError,
};
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use join_room::JoinRoomUseCase;
pub use kick_participant::{KICK_BAN_DURATION_MS, KickParticipantUseCase};
pub use reconcile_playback::{ReconcilePlaybackUseCase, ReconcileReport};
pub use relay_signal::RelaySignalUseCase;
pub use send_chat::SendChatUseCase;
pub use sequencer::RoomSequencer;
pub use set_muted::SetMutedUseCase;
