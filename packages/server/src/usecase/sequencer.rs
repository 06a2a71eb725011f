//! Room ごとの再生状態の確定と配信の順序付け
//!
//! 再生状態を書き込むユースケース（ホスト操作・リコンシリエーション）は、
//! 読み出し → version 照合付きの書き込み → syncState の配信までを
//! 同じ Room のターンの中で行う。これにより、ある Room に届く syncState は
//! 書き込まれた順（version の昇順）に並ぶ。

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::RoomId;

/// Room ごとの排他ターン
#[derive(Default)]
pub struct RoomSequencer {
    turns: Mutex<HashMap<RoomId, Arc<Mutex<()>>>>,
}

impl RoomSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Room のターンを取得する（ガードを drop するまで同じ Room の他のターンは待つ）
    pub async fn lock(&self, room_id: &RoomId) -> OwnedMutexGuard<()> {
        let turn = {
            let mut turns = self.turns.lock().await;
            // 誰も保持・待機していないターンは捨てる
            turns.retain(|_, turn| Arc::strong_count(turn) > 1);
            turns.entry(room_id.clone()).or_default().clone()
        };
        turn.lock_owned().await
    }

    /// 保持しているターンの数
    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.turns.lock().await.len()
    }
}
