//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    ChatMessage, JoinCode, Participant, PlaybackState, RepositoryError, Room, RoomId, Timestamp,
    UserId,
};

/// Room Repository trait
///
/// Room の唯一の真実の置き場所。last-writer-wins のマップとして扱い、
/// トランザクションは持たない。
///
/// ## 部分更新
///
/// 名簿・チャット・BAN・再生状態はそれぞれ専用のメソッドで更新する。
/// Room 全体を読み出して `put` で書き戻すと、並行する再生操作を古い値で
/// 上書きしてしまうため、`put` は作成時にだけ使う。
///
/// ## 再生状態の楽観的並行性制御
///
/// `update_playback` は保存されている `PlaybackState::version` が
/// `expected_version` と一致する場合だけ書き込む。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Room を取得
    async fn get(&self, room_id: &RoomId) -> Result<Option<Room>, RepositoryError>;

    /// Room を保存（同じ ID があれば上書き）
    async fn put(&self, room: Room) -> Result<(), RepositoryError>;

    /// 参加コードが他の Room と重複しない場合だけ Room を保存
    ///
    /// 重複の確認と保存は分割されない 1 つの操作として行う。
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - 保存した
    /// * `Ok(false)` - 参加コードが使用中だったので保存しなかった
    async fn put_with_unique_join_code(&self, room: Room) -> Result<bool, RepositoryError>;

    /// Room を削除し、削除した Room を返す
    async fn remove(&self, room_id: &RoomId) -> Result<Option<Room>, RepositoryError>;

    /// 参加コードで Room を検索
    async fn find_by_join_code(&self, code: &JoinCode) -> Result<Option<Room>, RepositoryError>;

    /// Room 数
    async fn count(&self) -> Result<usize, RepositoryError>;

    /// 全 Room を作成日時順に取得
    async fn list(&self) -> Result<Vec<Room>, RepositoryError>;

    /// 再生状態を条件付きで更新
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - 書き込んだ
    /// * `Ok(false)` - version が一致しなかったので書き込まなかった
    async fn update_playback(
        &self,
        room_id: &RoomId,
        expected_version: u64,
        state: PlaybackState,
    ) -> Result<bool, RepositoryError>;

    /// 参加者を名簿に追加（定員チェックは Room が行う）
    async fn add_participant(
        &self,
        room_id: &RoomId,
        participant: Participant,
    ) -> Result<(), RepositoryError>;

    /// 参加者を名簿から削除
    async fn remove_participant(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
    ) -> Result<Option<Participant>, RepositoryError>;

    /// メッセージを Room のチャット履歴に追加
    async fn add_message(&self, room_id: &RoomId, message: ChatMessage)
    -> Result<(), RepositoryError>;

    /// user を `until` まで BAN する（`banned_at` 時点で期限切れの BAN は取り除く）
    async fn ban_user(
        &self,
        room_id: &RoomId,
        user_id: UserId,
        banned_at: Timestamp,
        until: Timestamp,
    ) -> Result<(), RepositoryError>;
}
