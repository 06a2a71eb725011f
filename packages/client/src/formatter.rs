//! Message formatting utilities for client display.

use sajiki_server::infrastructure::dto::websocket::{
    ChatMessageDto, ParticipantDto, PlaybackStateDto, RoomDto,
};
use sajiki_shared::time::timestamp_to_jst_rfc3339;

use crate::drift::Correction;

const RULE: &str = "============================================================";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the room snapshot received right after joining
    ///
    /// # Arguments
    ///
    /// * `room` - The room snapshot
    /// * `participants` - Participants connected at join time
    /// * `current_user_id` - The current user's ID (to mark as "me")
    pub fn format_room_state(
        room: &RoomDto,
        participants: &[ParticipantDto],
        current_user_id: &str,
    ) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n\n{}\n", RULE));
        output.push_str(&format!("Room: {}", room.id));
        if let Some(code) = &room.join_code {
            output.push_str(&format!(" (join code {})", code));
        }
        output.push('\n');
        output.push_str(&format!(
            "Now playing: {}\n",
            Self::format_playback(&room.playback)
        ));
        output.push_str("Participants:\n");

        if participants.is_empty() {
            output.push_str("(No participants)\n");
        } else {
            for participant in participants {
                let mut tags = Vec::new();
                if participant.is_host {
                    tags.push("host");
                }
                if participant.user_id == current_user_id {
                    tags.push("me");
                }
                if participant.is_muted {
                    tags.push("muted");
                }
                let suffix = if tags.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", tags.join(", "))
                };
                output.push_str(&format!(
                    "{}{} - joined at {}\n",
                    participant.display_name,
                    suffix,
                    timestamp_to_jst_rfc3339(participant.joined_at)
                ));
            }
        }

        if !room.chat_history.is_empty() {
            output.push_str("Recent chat:\n");
            for message in &room.chat_history {
                output.push_str(&format!("  @{}: {}\n", message.display_name, message.text));
            }
        }

        output.push_str(&format!("{}\n", RULE));
        output
    }

    /// One-line description of a playback state
    pub fn format_playback(playback: &PlaybackStateDto) -> String {
        if playback.source_url.is_empty() {
            return "(nothing loaded)".to_string();
        }
        format!(
            "{} [{}] at {:.1}s (v{})",
            playback.source_url,
            if playback.is_playing { "playing" } else { "paused" },
            playback.position_seconds,
            playback.version
        )
    }

    pub fn format_participant_joined(participant: &ParticipantDto) -> String {
        format!(
            "\n+ {} entered at {}\n",
            participant.display_name,
            timestamp_to_jst_rfc3339(participant.joined_at)
        )
    }

    pub fn format_participant_left(display_name: &str) -> String {
        format!("\n- {} left\n", display_name)
    }

    pub fn format_participant_muted(user_id: &str, muted: bool) -> String {
        let state = if muted { "muted" } else { "unmuted" };
        format!("\n* {} {}\n", user_id, state)
    }

    /// Format a chat message
    pub fn format_chat_message(message: &ChatMessageDto) -> String {
        let mut body = message.text.clone();
        if let Some(image) = &message.image_ref {
            if !body.is_empty() {
                body.push(' ');
            }
            body.push_str(&format!("[image: {}]", image));
        }
        format!(
            "\n\n------------------------------------------------------------\n\
             @{}: {}\n\
             sent at {}\n\
             ------------------------------------------------------------\n",
            message.display_name,
            body,
            timestamp_to_jst_rfc3339(message.sent_at)
        )
    }

    /// Format a playback change announced by the server
    pub fn format_sync(playback: &PlaybackStateDto) -> String {
        format!("\n> {}\n", Self::format_playback(playback))
    }

    pub fn format_signal(kind: &str, from_user_id: &str) -> String {
        format!("\n~ {} from {} (voice is not supported in the CLI)\n", kind, from_user_id)
    }

    pub fn format_error(code: &str, message: &str) -> String {
        format!("\n! [{}] {}\n", code, message)
    }

    /// Local player and drift status for `/status`
    pub fn format_status(
        position: f64,
        rate: f64,
        expected: Option<f64>,
        offset_ms: i64,
        correction: &Correction,
    ) -> String {
        let expected = match expected {
            Some(expected) => format!("{:.3}s (drift {:+.3}s)", expected, position - expected),
            None => "unknown".to_string(),
        };
        format!(
            "\nlocal {:.3}s x{:.2}, expected {}, clock offset {}ms, last correction {:?}\n",
            position, rate, expected, offset_ms, correction
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sajiki_server::infrastructure::dto::websocket::SourceKindDto;

    fn participant(user_id: &str, is_host: bool) -> ParticipantDto {
        ParticipantDto {
            user_id: user_id.to_string(),
            display_name: user_id.to_string(),
            is_host,
            is_muted: false,
            joined_at: 0,
        }
    }

    fn playback(url: &str) -> PlaybackStateDto {
        PlaybackStateDto {
            source_url: url.to_string(),
            source_kind: SourceKindDto::RawFile,
            position_seconds: 12.34,
            is_playing: true,
            last_updated_at_ms: 0,
            version: 3,
        }
    }

    #[test]
    fn test_format_room_state_marks_host_and_me() {
        // テスト項目: 参加者一覧でホストと自分に印が付く
        // given (前提条件):
        let room = RoomDto {
            id: "r1".to_string(),
            join_code: Some("12345".to_string()),
            host_user_id: "host".to_string(),
            max_participants: 10,
            playback: playback(""),
            chat_history: Vec::new(),
            created_at: 0,
        };
        let participants = vec![participant("host", true), participant("alice", false)];

        // when (操作):
        let formatted = MessageFormatter::format_room_state(&room, &participants, "alice");

        // then (期待する結果):
        assert!(formatted.contains("Room: r1 (join code 12345)"));
        assert!(formatted.contains("(nothing loaded)"));
        assert!(formatted.contains("host (host) - joined at"));
        assert!(formatted.contains("alice (me) - joined at"));
    }

    #[test]
    fn test_format_playback() {
        // テスト項目: 再生状態が 1 行で表示される
        // given (前提条件):
        let state = playback("https://cdn.example/movie.mp4");

        // when (操作):
        let formatted = MessageFormatter::format_playback(&state);

        // then (期待する結果):
        assert_eq!(formatted, "https://cdn.example/movie.mp4 [playing] at 12.3s (v3)");
    }

    #[test]
    fn test_format_chat_with_image() {
        // テスト項目: 画像付きチャットは画像参照も表示される
        // given (前提条件):
        let message = ChatMessageDto {
            id: "m1".to_string(),
            user_id: "alice".to_string(),
            display_name: "Alice".to_string(),
            text: String::new(),
            client_message_id: None,
            image_ref: Some("img-1".to_string()),
            sent_at: 0,
        };

        // when (操作):
        let formatted = MessageFormatter::format_chat_message(&message);

        // then (期待する結果):
        assert!(formatted.contains("@Alice: [image: img-1]"));
    }

    #[test]
    fn test_format_status_shows_drift() {
        // テスト項目: /status の表示にズレが符号付きで含まれる
        // given (前提条件):

        // when (操作):
        let formatted =
            MessageFormatter::format_status(9.5, 1.08, Some(10.0), -20, &Correction::Idle);

        // then (期待する結果):
        assert!(formatted.contains("drift -0.500s"));
        assert!(formatted.contains("clock offset -20ms"));
    }
}
