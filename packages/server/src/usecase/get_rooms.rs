//! UseCase: Room 一覧の取得

use std::sync::Arc;

use crate::domain::{RepositoryError, Room, RoomRepository};

/// Room 一覧取得のユースケース
pub struct GetRoomsUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomsUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// 全 Room を作成日時順に返す
    pub async fn execute(&self) -> Result<Vec<Room>, RepositoryError> {
        self.repository.list().await
    }
}
