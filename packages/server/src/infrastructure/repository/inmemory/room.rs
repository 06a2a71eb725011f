//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! 各メソッドはロックを取得してから読み書きを終えるまで保持するため、
//! 1 回の呼び出しの中では Room 全体が一貫した状態で扱われます。
//! ロックを await をまたいで保持することはありません。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ChatMessage, JoinCode, Participant, PlaybackState, RepositoryError, Room, RoomId,
    RoomRepository, Timestamp, UserId,
};

/// インメモリ Room Repository 実装
#[derive(Default)]
pub struct InMemoryRoomRepository {
    rooms: Mutex<HashMap<RoomId, Room>>,
}

impl InMemoryRoomRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(room_id: &RoomId) -> RepositoryError {
    RepositoryError::RoomNotFound(room_id.as_str().to_string())
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn get(&self, room_id: &RoomId) -> Result<Option<Room>, RepositoryError> {
        let rooms = self.rooms.lock().await;
        Ok(rooms.get(room_id).cloned())
    }

    async fn put(&self, room: Room) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        rooms.insert(room.id.clone(), room);
        Ok(())
    }

    async fn put_with_unique_join_code(&self, room: Room) -> Result<bool, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        if let Some(code) = room.join_code.as_ref() {
            let taken = rooms
                .values()
                .any(|other| other.id != room.id && other.join_code.as_ref() == Some(code));
            if taken {
                return Ok(false);
            }
        }
        rooms.insert(room.id.clone(), room);
        Ok(true)
    }

    async fn remove(&self, room_id: &RoomId) -> Result<Option<Room>, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        Ok(rooms.remove(room_id))
    }

    async fn find_by_join_code(&self, code: &JoinCode) -> Result<Option<Room>, RepositoryError> {
        let rooms = self.rooms.lock().await;
        Ok(rooms
            .values()
            .find(|room| room.join_code.as_ref() == Some(code))
            .cloned())
    }

    async fn count(&self) -> Result<usize, RepositoryError> {
        let rooms = self.rooms.lock().await;
        Ok(rooms.len())
    }

    async fn list(&self) -> Result<Vec<Room>, RepositoryError> {
        let rooms = self.rooms.lock().await;
        let mut list: Vec<Room> = rooms.values().cloned().collect();
        list.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(list)
    }

    async fn update_playback(
        &self,
        room_id: &RoomId,
        expected_version: u64,
        state: PlaybackState,
    ) -> Result<bool, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(room_id).ok_or_else(|| not_found(room_id))?;

        if room.playback.version != expected_version {
            tracing::debug!(
                "Playback update for room '{}' rejected: expected version {}, found {}",
                room_id.as_str(),
                expected_version,
                room.playback.version
            );
            return Ok(false);
        }

        room.playback = state;
        Ok(true)
    }

    async fn add_participant(
        &self,
        room_id: &RoomId,
        participant: Participant,
    ) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(room_id).ok_or_else(|| not_found(room_id))?;
        room.add_participant(participant)?;
        Ok(())
    }

    async fn remove_participant(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
    ) -> Result<Option<Participant>, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(room_id).ok_or_else(|| not_found(room_id))?;
        Ok(room.remove_participant(user_id))
    }

    async fn add_message(
        &self,
        room_id: &RoomId,
        message: ChatMessage,
    ) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(room_id).ok_or_else(|| not_found(room_id))?;
        room.add_message(message);
        Ok(())
    }

    async fn ban_user(
        &self,
        room_id: &RoomId,
        user_id: UserId,
        banned_at: Timestamp,
        until: Timestamp,
    ) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(room_id).ok_or_else(|| not_found(room_id))?;
        room.lift_expired_bans(banned_at);
        room.ban(user_id, until);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DisplayName, MessageContent, RoomError};

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - InMemoryRoomRepository の基本的な CRUD 操作
    // - 再生状態の条件付き更新（version 照合）
    // - 名簿・チャット・BAN の部分更新が他のフィールドを壊さないこと
    //
    // 【なぜこのテストが必要か】
    // - Repository は UseCase から呼ばれるデータアクセス層の中核
    // - リコンシリエーションとホスト操作の競合を version 照合で防ぐ必要がある
    // ========================================

    fn room_id(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn participant(id: &str) -> Participant {
        Participant::new(
            user(id),
            DisplayName::new(id.to_string()).unwrap(),
            Timestamp::new(0),
        )
    }

    async fn create_test_repository() -> InMemoryRoomRepository {
        let repo = InMemoryRoomRepository::new();
        let room = Room::with_capacity(room_id("room-1"), user("host"), Timestamp::new(0), 2, 100)
            .with_join_code(JoinCode::new("12345".to_string()).unwrap());
        repo.put(room).await.unwrap();
        repo
    }

    #[tokio::test]
    async fn test_put_get_count_remove() {
        // テスト項目: Room の保存・取得・件数・削除ができる
        // given (前提条件):
        let repo = create_test_repository().await;

        // when (操作):
        let found = repo.get(&room_id("room-1")).await.unwrap();
        let missing = repo.get(&room_id("room-x")).await.unwrap();

        // then (期待する結果):
        assert!(found.is_some());
        assert!(missing.is_none());
        assert_eq!(repo.count().await.unwrap(), 1);

        let removed = repo.remove(&room_id("room-1")).await.unwrap();
        assert!(removed.is_some());
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_by_join_code() {
        // テスト項目: 参加コードで Room を検索できる
        // given (前提条件):
        let repo = create_test_repository().await;

        // when (操作):
        let found = repo
            .find_by_join_code(&JoinCode::new("12345".to_string()).unwrap())
            .await
            .unwrap();
        let missing = repo
            .find_by_join_code(&JoinCode::new("99999".to_string()).unwrap())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(found.map(|r| r.id), Some(room_id("room-1")));
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_update_playback_with_matching_version() {
        // テスト項目: version が一致すれば再生状態が更新される
        // given (前提条件):
        let repo = create_test_repository().await;
        let room = repo.get(&room_id("room-1")).await.unwrap().unwrap();
        let next = room.playback.play(Timestamp::new(1000));

        // when (操作):
        let written = repo
            .update_playback(&room_id("room-1"), room.playback.version, next.clone())
            .await
            .unwrap();

        // then (期待する結果):
        assert!(written);
        let stored = repo.get(&room_id("room-1")).await.unwrap().unwrap();
        assert_eq!(stored.playback, next);
    }

    #[tokio::test]
    async fn test_update_playback_with_stale_version_is_rejected() {
        // テスト項目: 古い version を前提にした更新は書き込まれない
        // given (前提条件): 先にホスト操作で version が進んでいる
        let repo = create_test_repository().await;
        let snapshot = repo.get(&room_id("room-1")).await.unwrap().unwrap();
        let paused = snapshot.playback.pause(30.0, Timestamp::new(1000)).unwrap();
        repo.update_playback(&room_id("room-1"), snapshot.playback.version, paused.clone())
            .await
            .unwrap();

        // when (操作): 古いスナップショットからの更新
        let stale = snapshot.playback.play(Timestamp::new(1100));
        let written = repo
            .update_playback(&room_id("room-1"), snapshot.playback.version, stale)
            .await
            .unwrap();

        // then (期待する結果): 停止状態が保たれる
        assert!(!written);
        let stored = repo.get(&room_id("room-1")).await.unwrap().unwrap();
        assert_eq!(stored.playback, paused);
    }

    #[tokio::test]
    async fn test_update_playback_for_missing_room() {
        // テスト項目: 存在しない Room の再生状態更新は RoomNotFound
        // given (前提条件):
        let repo = InMemoryRoomRepository::new();

        // when (操作):
        let result = repo
            .update_playback(
                &room_id("nope"),
                0,
                PlaybackState::empty(Timestamp::new(0)),
            )
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(RepositoryError::RoomNotFound("nope".to_string())));
    }

    #[tokio::test]
    async fn test_add_participant_respects_capacity() {
        // テスト項目: 定員を超える参加者追加は拒否される
        // given (前提条件): 定員 2
        let repo = create_test_repository().await;
        repo.add_participant(&room_id("room-1"), participant("host"))
            .await
            .unwrap();
        repo.add_participant(&room_id("room-1"), participant("alice"))
            .await
            .unwrap();

        // when (操作):
        let result = repo
            .add_participant(&room_id("room-1"), participant("bob"))
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RepositoryError::Rejected(RoomError::RoomFull { max: 2 }))
        );
    }

    #[tokio::test]
    async fn test_partial_updates_do_not_touch_playback() {
        // テスト項目: 名簿・チャット更新は再生状態を変更しない
        // given (前提条件):
        let repo = create_test_repository().await;
        let room = repo.get(&room_id("room-1")).await.unwrap().unwrap();
        let playing = room.playback.play(Timestamp::new(500));
        repo.update_playback(&room_id("room-1"), room.playback.version, playing.clone())
            .await
            .unwrap();

        // when (操作):
        repo.add_participant(&room_id("room-1"), participant("alice"))
            .await
            .unwrap();
        repo.add_message(
            &room_id("room-1"),
            ChatMessage::new(
                user("alice"),
                DisplayName::new("alice".to_string()).unwrap(),
                MessageContent::new("hi".to_string()).unwrap(),
                Timestamp::new(600),
            ),
        )
        .await
        .unwrap();
        repo.remove_participant(&room_id("room-1"), &user("alice"))
            .await
            .unwrap();

        // then (期待する結果):
        let stored = repo.get(&room_id("room-1")).await.unwrap().unwrap();
        assert_eq!(stored.playback, playing);
        assert_eq!(stored.messages.len(), 1);
        assert!(stored.participants.is_empty());
    }

    #[tokio::test]
    async fn test_put_with_unique_join_code_rejects_taken_code() {
        // テスト項目: 使用中の参加コードを持つ Room は保存されず、空いているコードなら保存される
        // given (前提条件): room-1 が 12345 を使用中
        let repo = create_test_repository().await;
        let taken = Room::with_capacity(room_id("room-2"), user("bob"), Timestamp::new(0), 2, 100)
            .with_join_code(JoinCode::new("12345".to_string()).unwrap());
        let free = taken
            .clone()
            .with_join_code(JoinCode::new("67890".to_string()).unwrap());

        // when (操作):
        let rejected = repo.put_with_unique_join_code(taken).await.unwrap();
        let stored_before_free = repo.get(&room_id("room-2")).await.unwrap();
        let accepted = repo.put_with_unique_join_code(free).await.unwrap();

        // then (期待する結果):
        assert!(!rejected);
        assert!(stored_before_free.is_none());
        assert!(accepted);
        let found = repo
            .find_by_join_code(&JoinCode::new("67890".to_string()).unwrap())
            .await
            .unwrap();
        assert_eq!(found.map(|room| room.id), Some(room_id("room-2")));
    }

    #[tokio::test]
    async fn test_ban_user() {
        // テスト項目: BAN が Room に記録される
        // given (前提条件):
        let repo = create_test_repository().await;

        // when (操作):
        repo.ban_user(
            &room_id("room-1"),
            user("mallory"),
            Timestamp::new(0),
            Timestamp::new(60_000),
        )
        .await
        .unwrap();

        // then (期待する結果):
        let stored = repo.get(&room_id("room-1")).await.unwrap().unwrap();
        assert_eq!(
            stored.ban_remaining_millis(&user("mallory"), Timestamp::new(0)),
            Some(60_000)
        );
    }
}
