//! InMemory PresenceRegistry 実装
//!
//! 接続はプロセス再起動をまたいで生き残らないため、永続化は行わない。
//!
//! ## データ構造
//!
//! - `by_user`: `(room_id, user_id)` → PresenceEntry（正本）
//! - `by_connection`: connection_id → `(room_id, user_id)`（逆引き索引）
//!
//! 同じ user が再接続すると `by_user` の値が置き換わり、古い接続の索引は
//! 削除される。古い接続が後から切断しても、新しいエントリには影響しない。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, PresenceEntry, PresenceRegistry, RoomId, UserId};

type PresenceKey = (RoomId, UserId);

#[derive(Default)]
struct Inner {
    by_user: HashMap<PresenceKey, PresenceEntry>,
    by_connection: HashMap<ConnectionId, PresenceKey>,
}

/// インメモリ PresenceRegistry 実装
#[derive(Default)]
pub struct InMemoryPresenceRegistry {
    inner: Mutex<Inner>,
}

impl InMemoryPresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PresenceRegistry for InMemoryPresenceRegistry {
    async fn register(&self, entry: PresenceEntry) -> Option<PresenceEntry> {
        let mut inner = self.inner.lock().await;
        let key = (entry.room_id.clone(), entry.user_id.clone());

        // 同じ接続が別の (room, user) で登録されていた場合は先に外す
        let previous_key = inner
            .by_connection
            .insert(entry.connection_id.clone(), key.clone());
        if let Some(old_key) = previous_key
            && old_key != key
        {
            let owned = inner
                .by_user
                .get(&old_key)
                .is_some_and(|old| old.connection_id == entry.connection_id);
            if owned {
                inner.by_user.remove(&old_key);
            }
        }

        let connection_id = entry.connection_id.clone();
        let replaced = inner.by_user.insert(key, entry)?;

        // 同じ接続での再登録は置き換えとして扱わない
        if replaced.connection_id == connection_id {
            return None;
        }

        inner.by_connection.remove(&replaced.connection_id);
        tracing::debug!(
            "Presence for '{}' in room '{}' replaced (old connection '{}')",
            replaced.user_id.as_str(),
            replaced.room_id.as_str(),
            replaced.connection_id.as_str()
        );
        Some(replaced)
    }

    async fn unregister(&self, connection_id: &ConnectionId) -> Option<PresenceEntry> {
        let mut inner = self.inner.lock().await;
        let key = inner.by_connection.remove(connection_id)?;

        let owned_by_connection = inner
            .by_user
            .get(&key)
            .is_some_and(|entry| &entry.connection_id == connection_id);
        if !owned_by_connection {
            return None;
        }
        inner.by_user.remove(&key)
    }

    async fn find_by_user(&self, room_id: &RoomId, user_id: &UserId) -> Option<PresenceEntry> {
        let inner = self.inner.lock().await;
        inner
            .by_user
            .get(&(room_id.clone(), user_id.clone()))
            .cloned()
    }

    async fn find_by_connection(&self, connection_id: &ConnectionId) -> Option<PresenceEntry> {
        let inner = self.inner.lock().await;
        let key = inner.by_connection.get(connection_id)?;
        inner
            .by_user
            .get(key)
            .filter(|entry| &entry.connection_id == connection_id)
            .cloned()
    }

    async fn list_by_room(&self, room_id: &RoomId) -> Vec<PresenceEntry> {
        let inner = self.inner.lock().await;
        let mut entries: Vec<PresenceEntry> = inner
            .by_user
            .values()
            .filter(|entry| &entry.room_id == room_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        entries
    }

    async fn set_muted(&self, connection_id: &ConnectionId, muted: bool) -> Option<PresenceEntry> {
        let mut inner = self.inner.lock().await;
        let key = inner.by_connection.get(connection_id)?.clone();
        let entry = inner.by_user.get_mut(&key)?;
        if &entry.connection_id != connection_id {
            return None;
        }
        entry.is_muted = muted;
        Some(entry.clone())
    }

    async fn active_room_ids(&self) -> Vec<RoomId> {
        let inner = self.inner.lock().await;
        let mut room_ids: Vec<RoomId> = inner
            .by_user
            .keys()
            .map(|(room_id, _)| room_id.clone())
            .collect();
        room_ids.sort();
        room_ids.dedup();
        room_ids
    }
}
