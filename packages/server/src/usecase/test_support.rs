//! UseCase テスト用のフィクスチャ
//!
//! インメモリ実装と実際の WebSocketMessagePusher を組み合わせ、
//! 各接続に届いた JSON を受信チャンネルから取り出して検証する。

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{
    Mutex,
    mpsc::{self, UnboundedReceiver},
};
use tokio::task::JoinHandle;

use sajiki_shared::time::{Clock, ManualClock};

use crate::domain::{
    ChatMessage, ConnectionId, DisplayName, JoinCode, MessagePusher, Participant, PlaybackState,
    PresenceEntry, PresenceRegistry, RepositoryError, Room, RoomId, RoomRepository, Timestamp,
    UserId,
};
use crate::infrastructure::{
    message_pusher::WebSocketMessagePusher, presence::InMemoryPresenceRegistry,
    repository::InMemoryRoomRepository,
};

use super::sequencer::RoomSequencer;

pub(crate) struct Fixture {
    pub repository: Arc<InMemoryRoomRepository>,
    pub presence: Arc<InMemoryPresenceRegistry>,
    pub pusher: Arc<WebSocketMessagePusher>,
    pub sequencer: Arc<RoomSequencer>,
    pub clock: Arc<ManualClock>,
}

impl Fixture {
    pub fn new(start_millis: i64) -> Self {
        Self {
            repository: Arc::new(InMemoryRoomRepository::new()),
            presence: Arc::new(InMemoryPresenceRegistry::new()),
            pusher: Arc::new(WebSocketMessagePusher::new()),
            sequencer: Arc::new(RoomSequencer::new()),
            clock: Arc::new(ManualClock::new(start_millis)),
        }
    }

    pub fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    /// host を名簿に入れずに Room を作成する
    pub async fn create_room(&self, room: &str, host: &str, max_participants: usize) -> Room {
        let room = Room::with_capacity(
            room_id(room),
            user(host),
            self.now(),
            max_participants,
            100,
        );
        self.repository.put(room.clone()).await.unwrap();
        room
    }

    /// 接続を登録し、Presence と名簿に追加した状態を作る
    pub async fn join(
        &self,
        connection: &str,
        room: &str,
        user_id: &str,
    ) -> UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.pusher.register_client(conn(connection), tx).await;

        let stored = self.repository.get(&room_id(room)).await.unwrap().unwrap();
        let is_host = stored.is_host(&user(user_id));
        self.repository
            .add_participant(
                &room_id(room),
                Participant::new(user(user_id), name(user_id), self.now()),
            )
            .await
            .unwrap();
        self.presence
            .register(PresenceEntry::new(
                conn(connection),
                user(user_id),
                name(user_id),
                room_id(room),
                is_host,
                self.now(),
            ))
            .await;
        rx
    }

    /// 接続だけ登録する（まだどの Room にも参加していない状態）
    pub async fn connect(&self, connection: &str) -> UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.pusher.register_client(conn(connection), tx).await;
        rx
    }

    pub async fn room(&self, room: &str) -> Option<Room> {
        self.repository.get(&room_id(room)).await.unwrap()
    }
}

/// 割り込ませる処理を差し込む位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InterleaveAt {
    /// 最初の get() で Room を読み出した直後
    Get,
    /// 最初に成功した update_playback() の直後
    UpdatePlayback,
}

type Interleaved = Pin<Box<dyn Future<Output = ()> + Send>>;

/// 指定した位置で一度だけ別タスクを走らせてから呼び出し元に戻る Repository
///
/// 読み出しと書き込み、書き込みと配信の間に他のユースケースが割り込む状況を作る。
pub(crate) struct InterleavingRepository {
    inner: Arc<InMemoryRoomRepository>,
    at: InterleaveAt,
    pending: Mutex<Option<Interleaved>>,
    spawned: Mutex<Option<JoinHandle<()>>>,
}

impl InterleavingRepository {
    pub fn new(
        inner: Arc<InMemoryRoomRepository>,
        at: InterleaveAt,
        task: impl Future<Output = ()> + Send + 'static,
    ) -> Self {
        Self {
            inner,
            at,
            pending: Mutex::new(Some(Box::pin(task))),
            spawned: Mutex::new(None),
        }
    }

    /// 割り込ませたタスクの完了を待つ
    pub async fn join_interleaved(&self) {
        let handle = self.spawned.lock().await.take();
        if let Some(handle) = handle {
            tokio::time::timeout(Duration::from_secs(3), handle)
                .await
                .unwrap()
                .unwrap();
        }
    }

    async fn interleave(&self, at: InterleaveAt) {
        if self.at != at {
            return;
        }
        let task = self.pending.lock().await.take();
        if let Some(task) = task {
            *self.spawned.lock().await = Some(tokio::spawn(task));
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

#[async_trait]
impl RoomRepository for InterleavingRepository {
    async fn get(&self, room_id: &RoomId) -> Result<Option<Room>, RepositoryError> {
        let room = self.inner.get(room_id).await?;
        self.interleave(InterleaveAt::Get).await;
        Ok(room)
    }

    async fn put(&self, room: Room) -> Result<(), RepositoryError> {
        self.inner.put(room).await
    }

    async fn put_with_unique_join_code(&self, room: Room) -> Result<bool, RepositoryError> {
        self.inner.put_with_unique_join_code(room).await
    }

    async fn remove(&self, room_id: &RoomId) -> Result<Option<Room>, RepositoryError> {
        self.inner.remove(room_id).await
    }

    async fn find_by_join_code(&self, code: &JoinCode) -> Result<Option<Room>, RepositoryError> {
        self.inner.find_by_join_code(code).await
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        self.inner.count().await
    }

    async fn list(&self) -> Result<Vec<Room>, RepositoryError> {
        self.inner.list().await
    }

    async fn update_playback(
        &self,
        room_id: &RoomId,
        expected_version: u64,
        state: PlaybackState,
    ) -> Result<bool, RepositoryError> {
        let written = self
            .inner
            .update_playback(room_id, expected_version, state)
            .await?;
        if written {
            self.interleave(InterleaveAt::UpdatePlayback).await;
        }
        Ok(written)
    }

    async fn add_participant(
        &self,
        room_id: &RoomId,
        participant: Participant,
    ) -> Result<(), RepositoryError> {
        self.inner.add_participant(room_id, participant).await
    }

    async fn remove_participant(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
    ) -> Result<Option<Participant>, RepositoryError> {
        self.inner.remove_participant(room_id, user_id).await
    }

    async fn add_message(
        &self,
        room_id: &RoomId,
        message: ChatMessage,
    ) -> Result<(), RepositoryError> {
        self.inner.add_message(room_id, message).await
    }

    async fn ban_user(
        &self,
        room_id: &RoomId,
        user_id: UserId,
        banned_at: Timestamp,
        until: Timestamp,
    ) -> Result<(), RepositoryError> {
        self.inner.ban_user(room_id, user_id, banned_at, until).await
    }
}

/// syncState の version を受信順に並べる
pub(crate) fn sync_versions(messages: &[Value]) -> Vec<u64> {
    messages
        .iter()
        .filter(|m| m["type"] == "syncState")
        .filter_map(|m| m["playback"]["version"].as_u64())
        .collect()
}

/// 受信済みのメッセージをすべて取り出す
pub(crate) fn drain(rx: &mut UnboundedReceiver<String>) -> Vec<Value> {
    let mut messages = Vec::new();
    while let Ok(text) = rx.try_recv() {
        messages.push(serde_json::from_str(&text).unwrap());
    }
    messages
}

/// 受信済みメッセージの type 一覧
pub(crate) fn types(messages: &[Value]) -> Vec<String> {
    messages
        .iter()
        .map(|m| m["type"].as_str().unwrap_or_default().to_string())
        .collect()
}

pub(crate) fn conn(id: &str) -> ConnectionId {
    ConnectionId::new(id.to_string()).unwrap()
}

pub(crate) fn room_id(id: &str) -> RoomId {
    RoomId::new(id.to_string()).unwrap()
}

pub(crate) fn user(id: &str) -> UserId {
    UserId::new(id.to_string()).unwrap()
}

pub(crate) fn name(value: &str) -> DisplayName {
    DisplayName::new(value.to_string()).unwrap()
}
