//! エンティティ定義
//!
//! Room は参加者名簿・再生状態・チャット履歴・BAN 情報を持つ集約です。

use std::collections::{HashMap, VecDeque};

use serde::Serialize;
use uuid::Uuid;

use super::{
    error::RoomError,
    playback::PlaybackState,
    value_object::{DisplayName, JoinCode, MessageContent, RoomId, Timestamp, UserId},
};

pub const DEFAULT_MAX_PARTICIPANTS: usize = 10;
pub const DEFAULT_CHAT_HISTORY_CAPACITY: usize = 100;

/// 名簿上の参加者
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Participant {
    pub user_id: UserId,
    pub display_name: DisplayName,
    pub joined_at: Timestamp,
}

impl Participant {
    pub fn new(user_id: UserId, display_name: DisplayName, joined_at: Timestamp) -> Self {
        Self {
            user_id,
            display_name,
            joined_at,
        }
    }
}

/// チャットメッセージ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub id: String,
    pub from: UserId,
    pub display_name: DisplayName,
    pub content: MessageContent,
    /// クライアント側の重複排除用 ID（送信者のエコーを照合する）
    pub client_message_id: Option<String>,
    /// 外部ストレージ上の画像への参照
    pub image_ref: Option<String>,
    pub sent_at: Timestamp,
}

impl ChatMessage {
    pub fn new(
        from: UserId,
        display_name: DisplayName,
        content: MessageContent,
        sent_at: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            from,
            display_name,
            content,
            client_message_id: None,
            image_ref: None,
            sent_at,
        }
    }

    pub fn with_client_message_id(mut self, client_message_id: Option<String>) -> Self {
        self.client_message_id = client_message_id;
        self
    }

    pub fn with_image_ref(mut self, image_ref: Option<String>) -> Self {
        self.image_ref = image_ref;
        self
    }
}

/// Room 集約
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Room {
    pub id: RoomId,
    pub join_code: Option<JoinCode>,
    /// ホスト（再生操作・キックができる唯一の参加者）
    pub host: UserId,
    pub participants: Vec<Participant>,
    pub playback: PlaybackState,
    /// 直近のチャット履歴（リングバッファ）
    pub messages: VecDeque<ChatMessage>,
    pub chat_history_capacity: usize,
    pub max_participants: usize,
    /// user_id ごとの BAN 解除時刻
    pub bans: HashMap<UserId, Timestamp>,
    pub created_at: Timestamp,
}

impl Room {
    pub fn new(id: RoomId, host: UserId, created_at: Timestamp) -> Self {
        Self::with_capacity(
            id,
            host,
            created_at,
            DEFAULT_MAX_PARTICIPANTS,
            DEFAULT_CHAT_HISTORY_CAPACITY,
        )
    }

    pub fn with_capacity(
        id: RoomId,
        host: UserId,
        created_at: Timestamp,
        max_participants: usize,
        chat_history_capacity: usize,
    ) -> Self {
        Self {
            id,
            join_code: None,
            host,
            participants: Vec::new(),
            playback: PlaybackState::empty(created_at),
            messages: VecDeque::with_capacity(chat_history_capacity),
            chat_history_capacity,
            max_participants,
            bans: HashMap::new(),
            created_at,
        }
    }

    pub fn with_join_code(mut self, join_code: JoinCode) -> Self {
        self.join_code = Some(join_code);
        self
    }

    pub fn is_host(&self, user_id: &UserId) -> bool {
        &self.host == user_id
    }

    pub fn has_participant(&self, user_id: &UserId) -> bool {
        self.participants.iter().any(|p| &p.user_id == user_id)
    }

    /// 参加者を追加する
    ///
    /// 既に名簿にいる user_id の場合は再参加として表示名を更新し、定員チェックは行わない。
    /// 定員ちょうどの状態での新規参加は拒否される。
    pub fn add_participant(&mut self, participant: Participant) -> Result<(), RoomError> {
        if let Some(existing) = self
            .participants
            .iter_mut()
            .find(|p| p.user_id == participant.user_id)
        {
            existing.display_name = participant.display_name;
            return Ok(());
        }

        if self.participants.len() >= self.max_participants {
            return Err(RoomError::RoomFull {
                max: self.max_participants,
            });
        }

        self.participants.push(participant);
        Ok(())
    }

    pub fn remove_participant(&mut self, user_id: &UserId) -> Option<Participant> {
        let index = self.participants.iter().position(|p| &p.user_id == user_id)?;
        Some(self.participants.remove(index))
    }

    /// チャット履歴に追加する。容量を超えた分は古い順に捨てる。
    pub fn add_message(&mut self, message: ChatMessage) {
        if self.chat_history_capacity == 0 {
            return;
        }
        while self.messages.len() >= self.chat_history_capacity {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    pub fn ban(&mut self, user_id: UserId, until: Timestamp) {
        self.bans.insert(user_id, until);
    }

    /// BAN の残り時間（ミリ秒）。BAN されていない、または期限切れなら `None`。
    pub fn ban_remaining_millis(&self, user_id: &UserId, now: Timestamp) -> Option<i64> {
        let until = self.bans.get(user_id)?;
        let remaining = until.value() - now.value();
        (remaining > 0).then_some(remaining)
    }

    /// 期限切れの BAN を取り除く
    pub fn lift_expired_bans(&mut self, now: Timestamp) {
        self.bans.retain(|_, until| *until > now);
    }
}
