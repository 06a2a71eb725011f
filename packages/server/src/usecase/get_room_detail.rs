//! UseCase: Room 詳細の取得

use std::sync::Arc;

use crate::domain::{JoinCode, Room, RoomId, RoomRepository};

use super::error::GetRoomDetailError;

/// Room 詳細取得のユースケース
pub struct GetRoomDetailUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomDetailUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// ID で Room を取得
    pub async fn execute(&self, room_id: &RoomId) -> Result<Room, GetRoomDetailError> {
        self.repository
            .get(room_id)
            .await?
            .ok_or(GetRoomDetailError::RoomNotFound)
    }

    /// 参加コードで Room を取得
    pub async fn find_by_join_code(&self, code: &JoinCode) -> Result<Room, GetRoomDetailError> {
        self.repository
            .find_by_join_code(code)
            .await?
            .ok_or(GetRoomDetailError::RoomNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::test_support::{Fixture, room_id};

    #[tokio::test]
    async fn test_get_room_detail() {
        // テスト項目: 存在する Room は取得でき、存在しない Room は RoomNotFound
        // given (前提条件):
        let fixture = Fixture::new(0);
        fixture.create_room("r1", "host", 10).await;
        let usecase = GetRoomDetailUseCase::new(fixture.repository.clone());

        // when (操作):
        let found = usecase.execute(&room_id("r1")).await;
        let missing = usecase.execute(&room_id("r2")).await;

        // then (期待する結果):
        assert_eq!(found.map(|r| r.id), Ok(room_id("r1")));
        assert_eq!(missing.unwrap_err(), GetRoomDetailError::RoomNotFound);
    }

    #[tokio::test]
    async fn test_find_by_join_code() {
        // テスト項目: 参加コードで Room を取得できる
        // given (前提条件):
        let fixture = Fixture::new(0);
        let room = fixture
            .create_room("r1", "host", 10)
            .await
            .with_join_code(JoinCode::new("54321".to_string()).unwrap());
        fixture.repository.put(room).await.unwrap();
        let usecase = GetRoomDetailUseCase::new(fixture.repository.clone());

        // when (操作):
        let found = usecase
            .find_by_join_code(&JoinCode::new("54321".to_string()).unwrap())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(found.id, room_id("r1"));
    }
}
