//! MessagePusher trait 定義
//!
//! クライアントへのイベント通知の抽象化。WebSocket や将来の別トランスポートの
//! 具体的な実装は Infrastructure 層が提供します。
//!
//! ## 順序保証
//!
//! 同じ接続に対する push は呼び出し順に届かなければならない。クライアントは
//! 「最後に受け取ったものが正しい」前提で同期するため、並べ替えは同期ずれに直結する。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError, RoomEvent};

/// 接続ごとの送信チャンネル（エンコード済みメッセージ）
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続の送信チャンネルを登録
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続の送信チャンネルを登録解除（チャンネルが閉じ、接続が終了する）
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 特定の接続にイベントを送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        event: &RoomEvent,
    ) -> Result<(), MessagePushError>;

    /// 複数の接続にイベントを送信（一部の送信失敗は許容する）
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        event: &RoomEvent,
    ) -> Result<(), MessagePushError>;
}
