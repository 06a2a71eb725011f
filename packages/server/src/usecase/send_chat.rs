//! UseCase: チャットの送信
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendChatUseCase::execute() メソッド
//! - チャット履歴への追加と、送信者を含む全員への配信
//!
//! ### なぜこのテストが必要か
//! - 送信者は clientMessageId で自分の送信を確認するため、送信者にも配信する必要がある
//! - 履歴はリングバッファで上限を超えた分が捨てられる
//!
//! ### どのような状況を想定しているか
//! - 正常系：テキスト送信、画像参照付き送信
//! - 異常系：空メッセージ、長すぎるメッセージ、未参加の接続

use std::sync::Arc;

use sajiki_shared::time::Clock;

use crate::domain::{
    ChatMessage, ConnectionId, MessageContent, MessagePusher, PresenceRegistry, RoomEvent, RoomId,
    RoomRepository, Timestamp,
};

use super::{
    error::ChatError,
    membership::{resolve_member, room_connections},
};

/// チャット送信のユースケース
pub struct SendChatUseCase {
    repository: Arc<dyn RoomRepository>,
    presence: Arc<dyn PresenceRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl SendChatUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        presence: Arc<dyn PresenceRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            presence,
            message_pusher,
            clock,
        }
    }

    /// チャットを送信
    ///
    /// 本文が空白だけの場合は画像参照がある時だけ受け付ける。
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
        text: String,
        client_message_id: Option<String>,
        image_ref: Option<String>,
    ) -> Result<ChatMessage, ChatError> {
        let (_room, sender) = resolve_member(
            self.repository.as_ref(),
            self.presence.as_ref(),
            connection_id,
            room_id,
        )
        .await?;

        let content = MessageContent::new(text)?;
        let image_ref = image_ref.filter(|r| !r.trim().is_empty());
        if content.is_blank() && image_ref.is_none() {
            return Err(ChatError::EmptyMessage);
        }

        let message = ChatMessage::new(
            sender.user_id,
            sender.display_name,
            content,
            Timestamp::new(self.clock.now_millis()),
        )
        .with_client_message_id(client_message_id)
        .with_image_ref(image_ref);

        self.repository.add_message(room_id, message.clone()).await?;

        let targets = room_connections(self.presence.as_ref(), room_id, None).await;
        if let Err(e) = self
            .message_pusher
            .broadcast(targets, &RoomEvent::Chat(message.clone()))
            .await
        {
            tracing::warn!("Failed to broadcast chat message: {}", e);
        }

        tracing::debug!(
            "Chat from '{}' in room '{}' ({} chars)",
            message.from.as_str(),
            room_id.as_str(),
            message.content.as_str().chars().count()
        );
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorKind, value_object::MAX_MESSAGE_LENGTH};
    use crate::usecase::test_support::{Fixture, conn, drain, room_id, types};

    fn usecase(fixture: &Fixture) -> SendChatUseCase {
        SendChatUseCase::new(
            fixture.repository.clone(),
            fixture.presence.clone(),
            fixture.pusher.clone(),
            fixture.clock.clone(),
        )
    }

    #[tokio::test]
    async fn test_chat_is_stored_and_broadcast_to_everyone() {
        // テスト項目: チャットが履歴に追加され、送信者を含む全員に届く
        // given (前提条件):
        let fixture = Fixture::new(1000);
        fixture.create_room("r1", "host", 10).await;
        let mut host_rx = fixture.join("c-host", "r1", "host").await;
        let mut alice_rx = fixture.join("c-alice", "r1", "alice").await;

        // when (操作):
        let message = usecase(&fixture)
            .execute(
                &conn("c-alice"),
                &room_id("r1"),
                "hello".to_string(),
                Some("local-1".to_string()),
                None,
            )
            .await
            .unwrap();

        // then (期待する結果):
        let room = fixture.room("r1").await.unwrap();
        assert_eq!(room.messages.back().map(|m| m.id.clone()), Some(message.id));
        let alice_messages = drain(&mut alice_rx);
        assert_eq!(types(&alice_messages), vec!["chatMessage"]);
        assert_eq!(alice_messages[0]["clientMessageId"], "local-1");
        let host_messages = drain(&mut host_rx);
        assert_eq!(host_messages[0]["text"], "hello");
        assert_eq!(host_messages[0]["userId"], "alice");
    }

    #[tokio::test]
    async fn test_image_only_message_is_accepted() {
        // テスト項目: 本文が空でも画像参照があれば送信できる
        // given (前提条件):
        let fixture = Fixture::new(1000);
        fixture.create_room("r1", "host", 10).await;
        let _rx = fixture.join("c-host", "r1", "host").await;

        // when (操作):
        let result = usecase(&fixture)
            .execute(
                &conn("c-host"),
                &room_id("r1"),
                String::new(),
                None,
                Some("images/cat.png".to_string()),
            )
            .await;

        // then (期待する結果):
        assert_eq!(result.unwrap().image_ref.as_deref(), Some("images/cat.png"));
    }

    #[tokio::test]
    async fn test_blank_and_oversized_messages_are_rejected() {
        // テスト項目: 空白だけのメッセージと長すぎるメッセージは invalidInput
        // given (前提条件):
        let fixture = Fixture::new(1000);
        fixture.create_room("r1", "host", 10).await;
        let _rx = fixture.join("c-host", "r1", "host").await;
        let usecase = usecase(&fixture);

        // when (操作):
        let blank = usecase
            .execute(&conn("c-host"), &room_id("r1"), "   ".to_string(), None, None)
            .await;
        let oversized = usecase
            .execute(
                &conn("c-host"),
                &room_id("r1"),
                "a".repeat(MAX_MESSAGE_LENGTH + 1),
                None,
                None,
            )
            .await;

        // then (期待する結果):
        assert_eq!(blank.unwrap_err(), ChatError::EmptyMessage);
        assert_eq!(oversized.unwrap_err().kind(), ErrorKind::InvalidInput);
        assert!(fixture.room("r1").await.unwrap().messages.is_empty());
    }

    #[tokio::test]
    async fn test_chat_from_connection_not_in_room() {
        // テスト項目: 参加していない接続からのチャットは NotJoined
        // given (前提条件):
        let fixture = Fixture::new(1000);
        fixture.create_room("r1", "host", 10).await;
        let _rx = fixture.connect("c-stranger").await;

        // when (操作):
        let result = usecase(&fixture)
            .execute(&conn("c-stranger"), &room_id("r1"), "hi".to_string(), None, None)
            .await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err().kind(), ErrorKind::NotJoined);
    }
}
