//! UseCase: Room の作成

use std::sync::Arc;

use sajiki_shared::time::Clock;

use crate::domain::{JoinCodeFactory, Room, RoomIdFactory, RoomRepository, Timestamp, UserId};

use super::error::CreateRoomError;

/// 参加コードの衝突時に生成し直す回数の上限
const MAX_JOIN_CODE_ATTEMPTS: usize = 20;

/// Room 作成のユースケース
pub struct CreateRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    clock: Arc<dyn Clock>,
    default_max_participants: usize,
    chat_history_capacity: usize,
}

impl CreateRoomUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        clock: Arc<dyn Clock>,
        default_max_participants: usize,
        chat_history_capacity: usize,
    ) -> Self {
        Self {
            repository,
            clock,
            default_max_participants,
            chat_history_capacity,
        }
    }

    /// Room を作成する
    ///
    /// `with_join_code` が true の場合、稼働中の Room と重複しない 5 桁の参加コードを割り当てる。
    pub async fn execute(
        &self,
        host: UserId,
        max_participants: Option<usize>,
        with_join_code: bool,
    ) -> Result<Room, CreateRoomError> {
        let max_participants = max_participants.unwrap_or(self.default_max_participants);
        if max_participants == 0 {
            return Err(CreateRoomError::InvalidCapacity);
        }

        let now = Timestamp::new(self.clock.now_millis());
        let room = Room::with_capacity(
            RoomIdFactory::generate()?,
            host,
            now,
            max_participants,
            self.chat_history_capacity,
        );

        let room = if with_join_code {
            self.put_with_join_code(room).await?
        } else {
            self.repository.put(room.clone()).await?;
            room
        };
        tracing::info!(
            "Room '{}' created by '{}' (max {} participants{})",
            room.id.as_str(),
            room.host.as_str(),
            room.max_participants,
            room.join_code
                .as_ref()
                .map(|code| format!(", join code {}", code.as_str()))
                .unwrap_or_default()
        );
        Ok(room)
    }

    /// 稼働中の Room と重複しない参加コードを付けて保存する
    async fn put_with_join_code(&self, room: Room) -> Result<Room, CreateRoomError> {
        for _ in 0..MAX_JOIN_CODE_ATTEMPTS {
            let candidate = room.clone().with_join_code(JoinCodeFactory::generate()?);
            if self
                .repository
                .put_with_unique_join_code(candidate.clone())
                .await?
            {
                return Ok(candidate);
            }
        }
        Err(CreateRoomError::JoinCodeExhausted)
    }
}
