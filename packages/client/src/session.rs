//! WebSocket client session management.

use std::{sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use sajiki_server::infrastructure::dto::websocket::{ClientMessage, ServerMessage};
use sajiki_shared::time::Clock;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};

use crate::{
    command::{self, Command, HELP},
    domain::join_rejection,
    drift::{Correction, DriftConfig, DriftCorrector},
    error::ClientError,
    formatter::MessageFormatter,
    player::{MediaPlayer, SimulatedPlayer},
};

use super::ui::redisplay_prompt;

/// What the network loop should do after handling an input line
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Send(ClientMessage),
    Print(String),
    Quit,
}

/// Per-user session state that survives reconnects
///
/// Owns the local player and the drift corrector; the network loop feeds it
/// server messages, input lines and poll ticks.
pub struct SyncSession {
    room_id: String,
    user_id: String,
    display_name: String,
    clock: Arc<dyn Clock>,
    player: SimulatedPlayer,
    corrector: DriftCorrector,
    joined: bool,
    last_correction: Correction,
}

impl SyncSession {
    pub fn new(
        room_id: String,
        user_id: String,
        display_name: String,
        drift: DriftConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            room_id,
            user_id,
            display_name,
            player: SimulatedPlayer::new(clock.clone()),
            clock,
            corrector: DriftCorrector::new(drift),
            joined: false,
            last_correction: Correction::Idle,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn is_joined(&self) -> bool {
        self.joined
    }

    pub fn player(&self) -> &SimulatedPlayer {
        &self.player
    }

    /// Start over on a fresh connection
    pub fn join_message(&mut self) -> ClientMessage {
        self.joined = false;
        ClientMessage::Join {
            room_id: self.room_id.clone(),
            user_id: self.user_id.clone(),
            display_name: self.display_name.clone(),
        }
    }

    /// Apply one server message; returns text to show, or an error that ends the session
    pub fn handle_server_message(
        &mut self,
        message: ServerMessage,
    ) -> Result<Option<String>, ClientError> {
        let now = self.clock.now_millis();
        match message {
            ServerMessage::RoomState {
                room,
                participants,
                server_time_ms,
            } => {
                self.joined = true;
                self.corrector.reset();
                self.corrector.observe(&room.playback, server_time_ms, now);
                self.correct(now);
                Ok(Some(MessageFormatter::format_room_state(
                    &room,
                    &participants,
                    &self.user_id,
                )))
            }
            ServerMessage::SyncState {
                playback,
                server_time_ms,
            } => {
                let previous = self.corrector.state().cloned();
                let applied = self.corrector.observe(&playback, server_time_ms, now);
                self.correct(now);
                // 位置の定期チェックポイントは表示しない
                let changed = previous.is_none_or(|p| {
                    p.source_url != playback.source_url || p.is_playing != playback.is_playing
                });
                Ok((applied && changed).then(|| MessageFormatter::format_sync(&playback)))
            }
            ServerMessage::ParticipantJoined(participant) => Ok(Some(
                MessageFormatter::format_participant_joined(&participant),
            )),
            ServerMessage::ParticipantLeft { display_name, .. } => Ok(Some(
                MessageFormatter::format_participant_left(&display_name),
            )),
            ServerMessage::ParticipantMuted { user_id, muted } => Ok(Some(
                MessageFormatter::format_participant_muted(&user_id, muted),
            )),
            ServerMessage::ChatMessage(message) => {
                Ok(Some(MessageFormatter::format_chat_message(&message)))
            }
            ServerMessage::Offer { from_user_id, .. } => {
                Ok(Some(MessageFormatter::format_signal("offer", &from_user_id)))
            }
            ServerMessage::Answer { from_user_id, .. } => {
                Ok(Some(MessageFormatter::format_signal("answer", &from_user_id)))
            }
            ServerMessage::IceCandidate { .. } => Ok(None),
            ServerMessage::Kicked { reason } => Err(ClientError::Kicked(reason)),
            ServerMessage::RoomClosed { reason } => Err(ClientError::RoomClosed(reason)),
            ServerMessage::ErrorSignal { code, message } => {
                if code == "sessionReplaced" {
                    return Err(ClientError::SessionReplaced);
                }
                if !self.joined
                    && let Some(error) = join_rejection(&code, &message)
                {
                    return Err(error);
                }
                Ok(Some(MessageFormatter::format_error(&code, &message)))
            }
        }
    }

    /// Turn an input line into an action
    pub fn handle_line(&mut self, line: &str) -> Action {
        match command::parse(line) {
            Ok(command) => self.handle_command(command),
            Err(e) => Action::Print(format!("\n! {}\n", e)),
        }
    }

    fn handle_command(&mut self, command: Command) -> Action {
        let room_id = self.room_id.clone();
        match command {
            Command::Play => Action::Send(ClientMessage::Play { room_id }),
            Command::Pause => Action::Send(ClientMessage::Pause {
                room_id,
                position_seconds: self.player.position(),
            }),
            Command::Seek(position_seconds) => Action::Send(ClientMessage::Seek {
                room_id,
                position_seconds,
            }),
            Command::Source { url, kind } => {
                Action::Send(ClientMessage::ChangeSource { room_id, url, kind })
            }
            Command::Kick(user_id) => Action::Send(ClientMessage::Kick { room_id, user_id }),
            Command::Mute(muted) => Action::Send(ClientMessage::SetMuted { room_id, muted }),
            Command::Sync => Action::Send(ClientMessage::RequestSync { room_id }),
            Command::Status => Action::Print(self.status()),
            Command::Stall => {
                let stalled = !self.player.is_buffering();
                self.player.set_stalled(stalled);
                Action::Print(format!(
                    "\nlocal player {}\n",
                    if stalled { "stalled" } else { "resumed" }
                ))
            }
            Command::Buffer(seconds) => {
                self.player.set_buffered_ahead(seconds);
                Action::Print(format!("\nbuffer ahead set to {:.1}s\n", seconds))
            }
            Command::Help => Action::Print(format!("\n{}\n", HELP)),
            Command::Quit => Action::Quit,
            Command::Chat(text) if text.is_empty() => Action::Print(String::new()),
            Command::Chat(text) => Action::Send(ClientMessage::Chat {
                room_id,
                text,
                client_message_id: Some(uuid::Uuid::new_v4().to_string()),
                image_ref: None,
            }),
        }
    }

    /// Periodic correction between broadcasts
    pub fn tick(&mut self) -> &Correction {
        let now = self.clock.now_millis();
        self.correct(now);
        &self.last_correction
    }

    fn correct(&mut self, now: i64) {
        let correction = self.corrector.evaluate(&mut self.player, now);
        if correction != self.last_correction
            && !matches!(correction, Correction::InSync { .. } | Correction::Idle)
        {
            tracing::debug!("Drift correction: {:?}", correction);
        }
        self.last_correction = correction;
    }

    fn status(&self) -> String {
        let now = self.clock.now_millis();
        MessageFormatter::format_status(
            self.player.position(),
            self.player.rate(),
            self.corrector.expected_position(now),
            self.corrector.server_clock_offset_ms(),
            &self.last_correction,
        )
    }
}

/// Run one WebSocket connection until it ends
///
/// Returns `Ok(())` when the user quits; any other ending is an error the
/// runner decides whether to reconnect on.
pub async fn run_client_session(
    url: &str,
    session: &mut SyncSession,
    input_rx: &mut mpsc::UnboundedReceiver<String>,
    poll_interval: Duration,
) -> Result<(), ClientError> {
    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;
    tracing::info!("Connected to sync server!");

    let (mut write, mut read) = ws_stream.split();

    let join = serde_json::to_string(&session.join_message())
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;
    write
        .send(Message::Text(join.into()))
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    let mut poll = tokio::time::interval(poll_interval);
    poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let output = match serde_json::from_str::<ServerMessage>(&text) {
                        Ok(message) => session.handle_server_message(message)?,
                        Err(e) => {
                            tracing::warn!("Failed to parse server message: {}", e);
                            Some(format!("\n{}\n", text))
                        }
                    };
                    if let Some(output) = output {
                        print!("{}", output);
                        redisplay_prompt(session.user_id());
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("Server closed the connection");
                    return Err(ClientError::ConnectionError("Connection lost".to_string()));
                }
                Some(Err(e)) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    return Err(ClientError::ConnectionError(e.to_string()));
                }
                Some(Ok(_)) => {}
            },
            line = input_rx.recv() => {
                let Some(line) = line else {
                    // stdin closed (Ctrl+D / Ctrl+C)
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                };
                match session.handle_line(&line) {
                    Action::Send(message) => {
                        let json = match serde_json::to_string(&message) {
                            Ok(json) => json,
                            Err(e) => {
                                tracing::error!("Failed to serialize message: {}", e);
                                continue;
                            }
                        };
                        if let Err(e) = write.send(Message::Text(json.into())).await {
                            tracing::warn!("Failed to send message: {}", e);
                            return Err(ClientError::ConnectionError(e.to_string()));
                        }
                    }
                    Action::Print(output) => print!("{}", output),
                    Action::Quit => {
                        let _ = write.send(Message::Close(None)).await;
                        return Ok(());
                    }
                }
                redisplay_prompt(session.user_id());
            },
            _ = poll.tick() => {
                session.tick();
            }
        }
    }
}
